use crate::db::open_sqlite_connection;
use crate::domain::supply::SupplyTrackingItem;
use crate::domain::types::SupplySource;
use crate::repository::error::{parse_enum, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// SupplyTrackingRepository - 供应台账仓储
// ==========================================
/// 供应台账仓储
/// 职责: 管理 supply_tracking 表
/// 说明: 台账键由引擎决定,仓储按 id 落库 (id 为空则新增)
pub struct SupplyTrackingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplyTrackingRepository {
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

    /// 按项目查询台账（按 id 排序,保证对账顺序稳定）
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<SupplyTrackingItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, catalog_item_id, item_code, item_name, unit,
                   required_quantity, received_quantity, unit_price, source
            FROM supply_tracking
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    SupplyTrackingItem {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        catalog_item_id: row.get(2)?,
                        item_code: row.get(3)?,
                        item_name: row.get(4)?,
                        unit: row.get(5)?,
                        required_quantity: row.get(6)?,
                        received_quantity: row.get(7)?,
                        unit_price: row.get(8)?,
                        source: SupplySource::Quantity,
                    },
                    row.get::<_, String>(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut item, source)| {
                item.source = parse_enum("source", &source, SupplySource::from_str)?;
                Ok(item)
            })
            .collect()
    }

    /// 保存台账（单事务）
    ///
    /// # 说明
    /// - id 为空: INSERT 并回填 id
    /// - id 非空: UPDATE 全部业务字段
    /// - 不删除任何行 (过期行由管理操作显式删除)
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    pub fn save_ledger(&self, ledger: &mut [SupplyTrackingItem]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut count = 0;
        for item in ledger.iter_mut() {
            match item.id {
                Some(id) => {
                    let affected = tx.execute(
                        r#"
                        UPDATE supply_tracking SET
                            catalog_item_id = ?1, item_code = ?2, item_name = ?3, unit = ?4,
                            required_quantity = ?5, received_quantity = ?6, unit_price = ?7,
                            source = ?8, updated_at = ?9
                        WHERE id = ?10
                        "#,
                        params![
                            item.catalog_item_id,
                            item.item_code,
                            item.item_name,
                            item.unit,
                            item.required_quantity,
                            item.received_quantity,
                            item.unit_price,
                            item.source.to_db_str(),
                            now,
                            id,
                        ],
                    )?;
                    if affected == 0 {
                        return Err(RepositoryError::NotFound {
                            entity: "SupplyTrackingItem".to_string(),
                            id: id.to_string(),
                        });
                    }
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO supply_tracking (
                            project_id, catalog_item_id, item_code, item_name, unit,
                            required_quantity, received_quantity, unit_price, source, updated_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                        "#,
                        params![
                            item.project_id,
                            item.catalog_item_id,
                            item.item_code,
                            item.item_name,
                            item.unit,
                            item.required_quantity,
                            item.received_quantity,
                            item.unit_price,
                            item.source.to_db_str(),
                            now,
                        ],
                    )?;
                    item.id = Some(tx.last_insert_rowid());
                }
            }
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 删除台账行（管理操作）
    pub fn delete(&self, item_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM supply_tracking WHERE id = ?1", params![item_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SupplyTrackingItem".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }
}
