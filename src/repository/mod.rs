// ==========================================
// 工程量计算引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod area_rule_repo;
pub mod boq_repo;
pub mod delivery_repo;
pub mod error;
pub mod floor_repo;
pub mod supply_repo;
pub mod unit_template_repo;

// 重导出核心仓储
pub use area_rule_repo::AreaRuleRepository;
pub use boq_repo::BoqSnapshotRepository;
pub use delivery_repo::{DeliveryRepository, PurchaseOrderLineEntity};
pub use error::{RepositoryError, RepositoryResult};
pub use floor_repo::FloorRepository;
pub use supply_repo::SupplyTrackingRepository;
pub use unit_template_repo::UnitTemplateRepository;
