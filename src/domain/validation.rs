// ==========================================
// 工程量计算引擎 - 输入校验
// ==========================================
// 红线: 负面积/负户数直接拒绝,不做静默截断
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 输入违规的实体类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Floor,
    UnitTemplate,
    TemplateMaterial,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Floor => write!(f, "FLOOR"),
            EntityKind::UnitTemplate => write!(f, "UNIT_TEMPLATE"),
            EntityKind::TemplateMaterial => write!(f, "TEMPLATE_MATERIAL"),
        }
    }
}

/// 单条输入违规
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputViolation {
    pub entity: EntityKind,
    pub entity_id: i64,
    pub field: String,
    pub value: f64,
}

impl fmt::Display for InputViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(id={}).{} = {}",
            self.entity, self.entity_id, self.field, self.value
        )
    }
}

/// 校验数值非负且有限,违规时追加到 `violations`
pub(crate) fn check_non_negative(
    entity: EntityKind,
    entity_id: i64,
    field: &str,
    value: f64,
    violations: &mut Vec<InputViolation>,
) {
    if !value.is_finite() || value < 0.0 {
        violations.push(InputViolation {
            entity,
            entity_id,
            field: field.to_string(),
            value,
        });
    }
}
