// ==========================================
// 工程量计算引擎 - 引擎层
// ==========================================
// 职责: 工程量汇总 + 供应对账,纯计算
// 红线: Engine 不拼 SQL, 不做 I/O, 不写日志
// 红线: 所有数据通过参数传入,以新值返回
// ==========================================

pub mod error;
pub mod reconcile;
pub mod takeoff;

// 重导出核心引擎
pub use error::{
    AttributionFailure, EngineError, EngineResult, RuleConfigurationError,
    UnattributedDeliveryWarning, ValidationError,
};
pub use reconcile::{DeliveryReconcileResult, SupplyReconciler, SupplySyncResult};
pub use takeoff::{area_quantity, BoqResult, QuantityTakeoffAggregator};
