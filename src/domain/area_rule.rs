// ==========================================
// 工程量计算引擎 - 面积材料规则
// ==========================================
// 职责: 按楼层面积计算的项目级材料规则 (钢筋/瓷砖/混凝土等)
// 不变量:
// - direct 方式忽略 factor 与楼层面积
// - 瓷砖宽高均 > 0 时为铺贴规则,按覆盖面积计算块数
// ==========================================

use crate::domain::types::{CalculationMethod, CalculationType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// AreaMaterialRule - 面积材料规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaMaterialRule {
    pub id: i64,
    pub project_id: i64,
    pub catalog_item_id: Option<i64>,
    pub item_name: String,
    pub unit: String,
    pub calculation_method: CalculationMethod,
    pub factor: f64,          // 每单位面积用量
    pub direct_quantity: f64, // direct 方式的数量
    pub unit_price: f64,
    pub calculation_type: CalculationType,
    pub selected_floor_id: Option<i64>, // selected_floor 时必填
    pub tile_width_cm: f64,
    pub tile_height_cm: f64,
    pub waste_percentage: f64, // 损耗率 (%)
}

/// 规则配置问题
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RuleConfigIssue {
    #[error("指定楼层规则缺少 selected_floor_id")]
    MissingSelectedFloor,

    #[error("字段 {field} 不能为负数或非有限值: {value}")]
    InvalidValue { field: String, value: f64 },
}

impl AreaMaterialRule {
    /// 是否为铺贴 (瓷砖) 规则
    pub fn is_tiling(&self) -> bool {
        self.tile_width_cm > 0.0 && self.tile_height_cm > 0.0
    }

    /// 单块瓷砖面积 (m²)
    pub fn tile_area_m2(&self) -> Option<f64> {
        if self.is_tiling() {
            Some((self.tile_width_cm / 100.0) * (self.tile_height_cm / 100.0))
        } else {
            None
        }
    }

    /// 损耗放大系数
    pub fn waste_multiplier(&self) -> f64 {
        1.0 + self.waste_percentage / 100.0
    }

    /// 检查规则配置,返回第一个问题
    pub fn configuration_issue(&self) -> Option<RuleConfigIssue> {
        if self.calculation_type == CalculationType::SelectedFloor
            && self.selected_floor_id.is_none()
        {
            return Some(RuleConfigIssue::MissingSelectedFloor);
        }

        let numeric_fields = [
            ("factor", self.factor),
            ("direct_quantity", self.direct_quantity),
            ("tile_width_cm", self.tile_width_cm),
            ("tile_height_cm", self.tile_height_cm),
            ("waste_percentage", self.waste_percentage),
        ];
        numeric_fields
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
            .map(|(field, value)| RuleConfigIssue::InvalidValue {
                field: field.to_string(),
                value: *value,
            })
    }
}
