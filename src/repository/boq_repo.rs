use crate::db::open_sqlite_connection;
use crate::domain::boq::{BoqLine, BoqSnapshot, FloorQuantity};
use crate::domain::types::BoqSource;
use crate::repository::error::{parse_enum, RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// BoqSnapshotRepository - 清单快照仓储
// ==========================================
/// 清单快照仓储
/// 职责: 管理 boq_snapshot / boq_snapshot_line 表
/// 红线: 每个项目只保留最近一次计算结果 (整体替换)
pub struct BoqSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 快照行原始数据 (枚举与 JSON 字段尚未解析)
struct SnapshotLineRow {
    line: BoqLine,
    source: String,
    floor_breakdown_json: String,
}

impl BoqSnapshotRepository {
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

    /// 替换项目的清单快照（单事务）
    ///
    /// # 说明
    /// - 删除该项目所有旧快照 (行级联删除)
    /// - 新快照 id 由仓储生成 (UUID v4)
    ///
    /// # 返回
    /// - Ok(BoqSnapshot): 已落库的快照
    pub fn replace_snapshot(
        &self,
        project_id: i64,
        lines: &[BoqLine],
        total_cost: f64,
        rule_error_count: i64,
        config_snapshot_json: Option<String>,
    ) -> RepositoryResult<BoqSnapshot> {
        let snapshot = BoqSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            project_id,
            total_cost,
            rule_error_count,
            config_snapshot_json,
            calculated_at: Utc::now(),
            lines: lines.to_vec(),
        };

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM boq_snapshot WHERE project_id = ?1",
            params![project_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO boq_snapshot (
                snapshot_id, project_id, total_cost, rule_error_count,
                config_snapshot_json, calculated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.project_id,
                snapshot.total_cost,
                snapshot.rule_error_count,
                snapshot.config_snapshot_json,
                snapshot.calculated_at.to_rfc3339(),
            ],
        )?;

        for (line_no, line) in snapshot.lines.iter().enumerate() {
            let breakdown_json = serde_json::to_string(&line.floor_breakdown)?;
            tx.execute(
                r#"
                INSERT INTO boq_snapshot_line (
                    snapshot_id, line_no, source, rule_id, catalog_item_id, item_code,
                    item_name, unit, quantity, unit_price, total_price, floor_breakdown_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    snapshot.snapshot_id,
                    line_no as i64,
                    line.source.to_db_str(),
                    line.rule_id,
                    line.catalog_item_id,
                    line.item_code,
                    line.item_name,
                    line.unit,
                    line.quantity,
                    line.unit_price,
                    line.total_price,
                    breakdown_json,
                ],
            )?;
        }

        tx.commit()?;
        Ok(snapshot)
    }

    /// 查询项目最近一次清单快照
    pub fn find_latest(&self, project_id: i64) -> RepositoryResult<Option<BoqSnapshot>> {
        let conn = self.get_conn()?;

        let header = conn
            .query_row(
                r#"
                SELECT snapshot_id, project_id, total_cost, rule_error_count,
                       config_snapshot_json, calculated_at
                FROM boq_snapshot
                WHERE project_id = ?1
                ORDER BY calculated_at DESC
                LIMIT 1
                "#,
                params![project_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((snapshot_id, project_id, total_cost, rule_error_count, config_json, calculated_at)) =
            header
        else {
            return Ok(None);
        };

        let calculated_at = DateTime::parse_from_rfc3339(&calculated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::FieldValueError {
                field: "calculated_at".to_string(),
                message: e.to_string(),
            })?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, rule_id, catalog_item_id, item_code, item_name, unit,
                   quantity, unit_price, total_price, floor_breakdown_json
            FROM boq_snapshot_line
            WHERE snapshot_id = ?1
            ORDER BY line_no
            "#,
        )?;
        let rows = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(SnapshotLineRow {
                    line: BoqLine {
                        catalog_item_id: row.get(2)?,
                        item_code: row.get(3)?,
                        item_name: row.get(4)?,
                        unit: row.get(5)?,
                        quantity: row.get(6)?,
                        unit_price: row.get(7)?,
                        total_price: row.get(8)?,
                        source: BoqSource::Unit,
                        rule_id: row.get(1)?,
                        floor_breakdown: Vec::new(),
                    },
                    source: row.get(0)?,
                    floor_breakdown_json: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let lines = rows
            .into_iter()
            .map(|row| {
                let mut line = row.line;
                line.source = parse_enum("source", &row.source, BoqSource::from_str)?;
                line.floor_breakdown =
                    serde_json::from_str::<Vec<FloorQuantity>>(&row.floor_breakdown_json)?;
                Ok(line)
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Some(BoqSnapshot {
            snapshot_id,
            project_id,
            total_cost,
            rule_error_count,
            config_snapshot_json: config_json,
            calculated_at,
            lines,
        }))
    }
}
