// ==========================================
// 工程量计算引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 住宅楼工程量清单 (BOQ) 计算与供应对账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 纯计算
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BoqSource, CalculationMethod, CalculationType, CompletionStatus, FloorKind, SupplySource,
};

// 领域实体
pub use domain::{
    AreaMaterialRule, BoqLine, BoqSnapshot, DeliveredItem, Floor, SupplyTrackingItem,
    TemplateMaterial, UnitTemplate,
};

// 引擎
pub use engine::{BoqResult, EngineError, QuantityTakeoffAggregator, SupplyReconciler};

// API
pub use api::{ApiError, BuildingQuantityApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工程量计算与供应对账引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
