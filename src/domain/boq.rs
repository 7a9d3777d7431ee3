// ==========================================
// 工程量计算引擎 - 工程量清单 (BOQ) 领域模型
// ==========================================
// 红线: BOQ 行为派生数据,每次计算重新生成,不做原地修改
// 行合价 = round(quantity, 2) × unit_price
// ==========================================

use crate::domain::types::{round_dp, BoqSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 数量保留小数位
pub const QUANTITY_DECIMALS: i32 = 2;

// ==========================================
// FloorQuantity - 分楼层用量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorQuantity {
    pub floor_id: i64,
    pub floor_number: i32,
    pub floor_name: String,
    pub area: f64,
    pub quantity: f64,
}

// ==========================================
// BoqLine - 清单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqLine {
    pub catalog_item_id: Option<i64>,
    pub item_code: Option<String>,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub source: BoqSource,
    pub rule_id: Option<i64>, // 面积材料行对应的规则 (审计追溯)
    #[serde(default)]
    pub floor_breakdown: Vec<FloorQuantity>,
}

impl BoqLine {
    /// 行合价
    pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
        round_dp(quantity, QUANTITY_DECIMALS) * unit_price
    }

    /// 展示用数量 (两位小数)
    pub fn rounded_quantity(&self) -> f64 {
        round_dp(self.quantity, QUANTITY_DECIMALS)
    }
}

// ==========================================
// 含钢量报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorSteel {
    pub floor_id: i64,
    pub floor_number: i32,
    pub floor_name: String,
    pub area: f64,
    pub steel_factor: f64,
    pub uses_project_default: bool,
    pub steel_kg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteelReport {
    pub floors: Vec<FloorSteel>,
    pub total_kg: f64,
    pub total_tons: f64,
}

// ==========================================
// BoqSummary - 清单汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoqSummary {
    pub total_floor_area: f64,
    pub total_units: i64,
    pub unit_materials_cost: f64,
    pub area_materials_cost: f64,
    pub total_cost: f64,
    pub cost_per_m2: f64, // 面积为 0 时为 0
}

// ==========================================
// BoqSnapshot - 已落库的清单快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqSnapshot {
    pub snapshot_id: String,
    pub project_id: i64,
    pub total_cost: f64,
    pub rule_error_count: i64,
    pub config_snapshot_json: Option<String>,
    pub calculated_at: DateTime<Utc>,
    pub lines: Vec<BoqLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_uses_rounded_quantity() {
        // 26.400000000000002 -> 26.40
        let qty = 300.0 * 0.08 * 1.1;
        assert_eq!(BoqLine::line_total(qty, 10.0), 264.0);
        assert_eq!(BoqLine::line_total(1.005_1, 100.0), 101.0);
    }
}
