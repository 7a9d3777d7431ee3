use crate::db::open_sqlite_connection;
use crate::domain::floor::Floor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// FloorRepository - 楼层仓储
// ==========================================
/// 楼层仓储
/// 职责: 管理 building_floor 表的 CRUD 操作
/// 红线: 不含业务逻辑，只负责数据访问
pub struct FloorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FloorRepository {
    /// 创建新的 FloorRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增楼层
    ///
    /// # 返回
    /// - Ok(i64): 新楼层 id
    pub fn insert(
        &self,
        project_id: i64,
        floor_number: i32,
        floor_name: &str,
        area: f64,
        steel_factor: Option<f64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO building_floor (project_id, floor_number, floor_name, area, steel_factor)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![project_id, floor_number, floor_name, area, steel_factor],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 批量新增楼层（单事务）
    ///
    /// 传入楼层的 id 被忽略,由数据库分配
    pub fn batch_insert(&self, project_id: i64, floors: &[Floor]) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut ids = Vec::with_capacity(floors.len());
        for floor in floors {
            tx.execute(
                r#"
                INSERT INTO building_floor (project_id, floor_number, floor_name, area, steel_factor)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    project_id,
                    floor.floor_number,
                    floor.floor_name,
                    floor.area,
                    floor.steel_factor
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit()?;
        Ok(ids)
    }

    /// 按项目查询楼层（按楼层号排序）
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<Floor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, floor_number, floor_name, area, steel_factor
            FROM building_floor
            WHERE project_id = ?1
            ORDER BY floor_number, id
            "#,
        )?;

        let floors = stmt
            .query_map(params![project_id], |row| {
                Ok(Floor {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    floor_number: row.get(2)?,
                    floor_name: row.get(3)?,
                    area: row.get(4)?,
                    steel_factor: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(floors)
    }

    /// 删除楼层
    pub fn delete(&self, floor_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM building_floor WHERE id = ?1", params![floor_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Floor".to_string(),
                id: floor_id.to_string(),
            });
        }
        Ok(())
    }
}
