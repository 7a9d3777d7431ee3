// ==========================================
// 工程量计算引擎 - 应用状态
// ==========================================
// 职责: 打开数据库、建表、装配仓储与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, BuildingQuantityApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::ProjectImporter;
use crate::repository::{
    AreaRuleRepository, BoqSnapshotRepository, DeliveryRepository, FloorRepository,
    SupplyTrackingRepository, UnitTemplateRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "TAKEOFF_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源（单一共享连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,
    /// 工程量与供应 API
    pub takeoff_api: Arc<BuildingQuantityApi>,
    /// 项目数据导入器
    pub importer: Arc<ProjectImporter>,
    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema（幂等）
    /// 2. 初始化所有Repository（共享连接）
    /// 3. 创建API与导入器实例
    pub fn new(db_path: String) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        init_schema(&conn)
            .map_err(|e| ApiError::DatabaseError(format!("schema 初始化失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let floor_repo = Arc::new(FloorRepository::from_connection(conn.clone()));
        let template_repo = Arc::new(UnitTemplateRepository::from_connection(conn.clone()));
        let area_rule_repo = Arc::new(AreaRuleRepository::from_connection(conn.clone()));
        let supply_repo = Arc::new(SupplyTrackingRepository::from_connection(conn.clone()));
        let delivery_repo = Arc::new(DeliveryRepository::from_connection(conn.clone()));
        let boq_repo = Arc::new(BoqSnapshotRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| ApiError::ConfigError(format!("无法创建ConfigManager: {}", e)))?,
        );

        // ==========================================
        // 创建API层
        // ==========================================
        let takeoff_api = Arc::new(BuildingQuantityApi::new(
            floor_repo.clone(),
            template_repo,
            area_rule_repo,
            supply_repo,
            delivery_repo.clone(),
            boq_repo,
            config_manager.clone(),
        ));
        let importer = Arc::new(ProjectImporter::new(floor_repo, delivery_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            takeoff_api,
            importer,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 TAKEOFF_DB_PATH（非空时）
/// - 否则: 用户数据目录/quantity-takeoff/quantity_takeoff.db
/// - 无法获取用户数据目录时: ./quantity_takeoff.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./quantity_takeoff.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("quantity-takeoff");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("quantity_takeoff.db");
        }
    }

    path.to_string_lossy().to_string()
}
