// ==========================================
// 工程量计算引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 覆写: project/{id} 覆盖 global
// ==========================================

use crate::config::takeoff_config_trait::TakeoffConfigReader;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取指定作用域的配置值（不做回退）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(
        &self,
        scope: &ConfigScope,
        key: &str,
    ) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取项目生效配置值（project 覆盖 global）
    pub fn get_effective_value(
        &self,
        project_id: i64,
        key: &str,
    ) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(value) = self.get_config_value(&ConfigScope::Project { project_id }, key)? {
            return Ok(Some(value));
        }
        self.get_config_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(
        &self,
        scope: &ConfigScope,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 删除指定作用域的配置值
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 配置不存在
    pub fn remove_config_value(&self, scope: &ConfigScope, key: &str) -> Result<bool, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(affected > 0)
    }

    /// 获取项目生效配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): global 配置叠加 project 覆写后的 JSON 对象 (键有序)
    ///
    /// # 用途
    /// - 与清单快照一起落库,保证计算结果可追溯
    pub fn get_config_snapshot(&self, project_id: i64) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT scope_id, key, value FROM config_kv WHERE scope_id IN (?1, ?2) ORDER BY key",
        )?;

        let project_scope = ConfigScope::Project { project_id }.scope_id();
        let rows = stmt.query_map(params![ConfigScope::Global.scope_id(), project_scope], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut global: BTreeMap<String, String> = BTreeMap::new();
        let mut project: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (scope_id, key, value) = row?;
            if scope_id == project_scope {
                project.insert(key, value);
            } else {
                global.insert(key, value);
            }
        }
        global.extend(project);

        Ok(serde_json::to_string(&json!(global))?)
    }
}

// ==========================================
// TakeoffConfigReader Trait 实现
// ==========================================
impl TakeoffConfigReader for ConfigManager {
    fn default_steel_factor(&self, project_id: i64) -> Result<f64, Box<dyn Error>> {
        let raw = self.get_effective_value(project_id, config_keys::DEFAULT_STEEL_FACTOR)?;
        let Some(raw) = raw else {
            return Ok(config_defaults::DEFAULT_STEEL_FACTOR);
        };

        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_STEEL_FACTOR,
                    project_id,
                    raw_value = %raw,
                    "含钢量配置无效，使用默认值"
                );
                Ok(config_defaults::DEFAULT_STEEL_FACTOR)
            }
        }
    }

    fn delivered_po_statuses(&self, project_id: i64) -> Result<Vec<String>, Box<dyn Error>> {
        let raw = self
            .get_effective_value(project_id, config_keys::DELIVERED_PO_STATUSES)?
            .unwrap_or_else(|| config_defaults::DELIVERED_PO_STATUSES.to_string());

        let statuses = parse_status_list(&raw);
        if statuses.is_empty() {
            tracing::warn!(
                config_key = config_keys::DELIVERED_PO_STATUSES,
                project_id,
                raw_value = %raw,
                "到货状态配置为空，使用默认值"
            );
            return Ok(parse_status_list(config_defaults::DELIVERED_PO_STATUSES));
        }
        Ok(statuses)
    }
}

fn parse_status_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                      // 全局
    Project { project_id: i64 }, // 项目
}

impl ConfigScope {
    /// config_kv.scope_id 存储形式
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Project { project_id } => format!("project/{}", project_id),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 含钢量 (kg/m²),用于未单独配置的楼层
    pub const DEFAULT_STEEL_FACTOR: &str = "default_steel_factor";

    // 视为已到货的采购订单状态 (逗号分隔)
    pub const DELIVERED_PO_STATUSES: &str = "delivered_po_statuses";
}

pub mod config_defaults {
    pub const DEFAULT_STEEL_FACTOR: f64 = 100.0;
    pub const DELIVERED_PO_STATUSES: &str = "delivered,received,completed";
}
