// ==========================================
// 工程量计算引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、实体级校验
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod area_rule;
pub mod boq;
pub mod floor;
pub mod supply;
pub mod template;
pub mod types;
pub mod validation;

// 重导出核心类型
pub use area_rule::{AreaMaterialRule, RuleConfigIssue};
pub use boq::{BoqLine, BoqSnapshot, BoqSummary, FloorQuantity, FloorSteel, SteelReport};
pub use floor::{Floor, FloorRegistry, ROOF_FLOOR_NUMBER};
pub use supply::{DeliveredItem, SupplyKey, SupplySummary, SupplyTrackingItem};
pub use template::{TemplateMaterial, UnitTemplate, UnitTemplateCatalog};
pub use types::{
    BoqSource, CalculationMethod, CalculationType, CompletionStatus, FloorKind, SupplySource,
};
pub use validation::{EntityKind, InputViolation};
