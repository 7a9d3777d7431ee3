// ==========================================
// 工程量计算引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 命令调用
// ==========================================

pub mod error;
pub mod takeoff_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use takeoff_api::{
    BuildingQuantityApi, CalculationResponse, DeliverySyncResponse, SupplyReport,
    SupplyReportItem, SupplySyncResponse,
};
