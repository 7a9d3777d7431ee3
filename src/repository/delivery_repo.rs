use crate::db::open_sqlite_connection;
use crate::domain::supply::DeliveredItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 采购订单行 (到货数据源)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLineEntity {
    pub id: Option<i64>,
    pub project_id: i64,
    pub po_number: String,
    pub status: String,
    pub catalog_item_id: Option<i64>,
    pub item_name: String,
    pub delivered_quantity: f64,
    pub delivered_at: Option<NaiveDate>,
}

impl PurchaseOrderLineEntity {
    pub fn to_delivered_item(&self) -> DeliveredItem {
        DeliveredItem {
            item_name: self.item_name.clone(),
            delivered_quantity: self.delivered_quantity,
            catalog_item_id: self.catalog_item_id,
        }
    }
}

// ==========================================
// DeliveryRepository - 到货数据仓储
// ==========================================
/// 到货数据仓储
/// 职责: 管理 purchase_order_line 表,向对账提供已到货行
pub struct DeliveryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeliveryRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量新增采购订单行（单事务）
    pub fn batch_insert(&self, lines: &[PurchaseOrderLineEntity]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for line in lines {
            tx.execute(
                r#"
                INSERT INTO purchase_order_line (
                    project_id, po_number, status, catalog_item_id, item_name,
                    delivered_quantity, delivered_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    line.project_id,
                    line.po_number,
                    line.status,
                    line.catalog_item_id,
                    line.item_name,
                    line.delivered_quantity,
                    line.delivered_at.map(|d| d.to_string()),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 按项目查询采购订单行
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<PurchaseOrderLineEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, po_number, status, catalog_item_id, item_name,
                   delivered_quantity, delivered_at
            FROM purchase_order_line
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )?;

        let lines = stmt
            .query_map(params![project_id], |row| {
                Ok(PurchaseOrderLineEntity {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    po_number: row.get(2)?,
                    status: row.get(3)?,
                    catalog_item_id: row.get(4)?,
                    item_name: row.get(5)?,
                    delivered_quantity: row.get(6)?,
                    delivered_at: row
                        .get::<_, Option<String>>(7)?
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// 查询项目已到货行
    ///
    /// # 参数
    /// - statuses: 视为已到货的订单状态 (大小写不敏感); 为空时返回空列表
    pub fn find_delivered_by_project(
        &self,
        project_id: i64,
        statuses: &[String],
    ) -> RepositoryResult<Vec<DeliveredItem>> {
        if statuses.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.get_conn()?;
        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT item_name, delivered_quantity, catalog_item_id
            FROM purchase_order_line
            WHERE project_id = ?1 AND LOWER(status) IN ({})
            ORDER BY id
            "#,
            placeholders
        );

        let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(statuses.len() + 1);
        values.push(project_id.into());
        for status in statuses {
            values.push(status.trim().to_lowercase().into());
        }

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(DeliveredItem {
                    item_name: row.get(0)?,
                    delivered_quantity: row.get(1)?,
                    catalog_item_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }
}
