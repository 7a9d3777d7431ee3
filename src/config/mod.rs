// ==========================================
// 工程量计算引擎 - 配置层
// ==========================================
// 职责: 系统配置管理,支持全局/项目两级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod takeoff_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_defaults, config_keys, ConfigManager, ConfigScope};
pub use takeoff_config_trait::TakeoffConfigReader;
