// ==========================================
// 工程量计算引擎 - 领域类型定义
// ==========================================
// 红线: 计算方式/计算范围/来源均为封闭枚举,不接受自由文本
// 存储格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计算方式 (Calculation Method)
// ==========================================
// factor: 面积 × 系数; direct: 直接给定数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Factor, // 按系数
    Direct, // 直接数量
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CalculationMethod {
    /// 从字符串解析计算方式
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "factor" => Some(CalculationMethod::Factor),
            "direct" => Some(CalculationMethod::Direct),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CalculationMethod::Factor => "factor",
            CalculationMethod::Direct => "direct",
        }
    }
}

// ==========================================
// 计算范围 (Calculation Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    AllFloors,     // 全部楼层面积之和
    SelectedFloor, // 指定单个楼层
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CalculationType {
    /// 从字符串解析计算范围
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all_floors" => Some(CalculationType::AllFloors),
            "selected_floor" => Some(CalculationType::SelectedFloor),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CalculationType::AllFloors => "all_floors",
            CalculationType::SelectedFloor => "selected_floor",
        }
    }
}

// ==========================================
// BOQ 行来源 (BOQ Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoqSource {
    Unit, // 户型材料 (按户数)
    Area, // 面积材料 (按楼层面积)
}

impl fmt::Display for BoqSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BoqSource {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unit" => Some(BoqSource::Unit),
            "area" => Some(BoqSource::Area),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BoqSource::Unit => "unit",
            BoqSource::Area => "area",
        }
    }

    /// 对应的供应台账来源
    pub fn supply_source(&self) -> SupplySource {
        match self {
            BoqSource::Unit => SupplySource::Quantity,
            BoqSource::Area => SupplySource::Area,
        }
    }
}

// ==========================================
// 供应台账来源 (Supply Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplySource {
    Quantity, // 来自户型工程量
    Area,     // 来自面积材料
}

impl fmt::Display for SupplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl SupplySource {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quantity" => Some(SupplySource::Quantity),
            "area" => Some(SupplySource::Area),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SupplySource::Quantity => "quantity",
            SupplySource::Area => "area",
        }
    }
}

// ==========================================
// 供应完成状态 (Completion Status)
// ==========================================
// 顺序: NotStarted < Partial < Complete < OverDelivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    NotStarted,    // 未到货
    Partial,       // 部分到货
    Complete,      // 已完成
    OverDelivered, // 超量到货
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionStatus::NotStarted => write!(f, "NOT_STARTED"),
            CompletionStatus::Partial => write!(f, "PARTIAL"),
            CompletionStatus::Complete => write!(f, "COMPLETE"),
            CompletionStatus::OverDelivered => write!(f, "OVER_DELIVERED"),
        }
    }
}

impl CompletionStatus {
    /// 由完成百分比推导状态
    ///
    /// 需求量为 0 时完成率恒为 0,按未到货处理
    pub fn from_percentage(pct: f64) -> Self {
        if pct <= 0.0 {
            CompletionStatus::NotStarted
        } else if pct < 100.0 {
            CompletionStatus::Partial
        } else if pct == 100.0 {
            CompletionStatus::Complete
        } else {
            CompletionStatus::OverDelivered
        }
    }
}

// ==========================================
// 楼层类别 (Floor Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloorKind {
    Substructure, // 地下结构 (负楼层号)
    Ground,       // 首层 (0)
    Typical,      // 标准层
    Roof,         // 屋面 (99)
}

impl fmt::Display for FloorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloorKind::Substructure => write!(f, "SUBSTRUCTURE"),
            FloorKind::Ground => write!(f, "GROUND"),
            FloorKind::Typical => write!(f, "TYPICAL"),
            FloorKind::Roof => write!(f, "ROOF"),
        }
    }
}

// ==========================================
// 数值工具
// ==========================================

/// 按小数位四舍五入 (远离零方向)
pub fn round_dp(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_db_strings_round_trip_through_parser() {
        assert_eq!(CalculationMethod::from_str("FACTOR"), Some(CalculationMethod::Factor));
        assert_eq!(CalculationMethod::from_str("direct "), Some(CalculationMethod::Direct));
        assert_eq!(CalculationMethod::from_str("area"), None);
        assert_eq!(
            CalculationType::from_str("selected_floor"),
            Some(CalculationType::SelectedFloor)
        );
        assert_eq!(SupplySource::from_str("quantity"), Some(SupplySource::Quantity));
        assert_eq!(BoqSource::Area.supply_source(), SupplySource::Area);
    }

    #[test]
    fn test_completion_status_from_percentage() {
        assert_eq!(CompletionStatus::from_percentage(0.0), CompletionStatus::NotStarted);
        assert_eq!(CompletionStatus::from_percentage(42.5), CompletionStatus::Partial);
        assert_eq!(CompletionStatus::from_percentage(100.0), CompletionStatus::Complete);
        assert_eq!(CompletionStatus::from_percentage(130.0), CompletionStatus::OverDelivered);
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(26.400000000000002, 2), 26.4);
        assert_eq!(round_dp(33.333333, 1), 33.3);
        assert_eq!(round_dp(12.345, 0), 12.0);
    }
}
