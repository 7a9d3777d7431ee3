use crate::db::open_sqlite_connection;
use crate::domain::template::{TemplateMaterial, UnitTemplate};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// UnitTemplateRepository - 户型模板仓储
// ==========================================
/// 户型模板仓储
/// 职责: 管理 unit_template / template_material 表
pub struct UnitTemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UnitTemplateRepository {
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

    /// 新增户型模板及其材料（单事务）
    ///
    /// # 返回
    /// - Ok(i64): 新模板 id
    pub fn insert(&self, template: &UnitTemplate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO unit_template (
                project_id, code, name, area, rooms_count, bathrooms_count, unit_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                template.project_id,
                template.code,
                template.name,
                template.area,
                template.rooms_count,
                template.bathrooms_count,
                template.unit_count,
            ],
        )?;
        let template_id = tx.last_insert_rowid();

        for material in &template.materials {
            tx.execute(
                r#"
                INSERT INTO template_material (
                    template_id, catalog_item_id, item_code, item_name, unit,
                    quantity_per_unit, unit_price
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    template_id,
                    material.catalog_item_id,
                    material.item_code,
                    material.item_name,
                    material.unit,
                    material.quantity_per_unit,
                    material.unit_price,
                ],
            )?;
        }

        tx.commit()?;
        Ok(template_id)
    }

    /// 更新户数
    pub fn update_unit_count(&self, template_id: i64, unit_count: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE unit_template SET unit_count = ?1 WHERE id = ?2",
            params![unit_count, template_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "UnitTemplate".to_string(),
                id: template_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按项目查询户型模板（含材料,按 id 排序）
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<UnitTemplate>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, code, name, area, rooms_count, bathrooms_count, unit_count
            FROM unit_template
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )?;
        let mut templates = stmt
            .query_map(params![project_id], |row| {
                Ok(UnitTemplate {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    code: row.get(2)?,
                    name: row.get(3)?,
                    area: row.get(4)?,
                    rooms_count: row.get(5)?,
                    bathrooms_count: row.get(6)?,
                    unit_count: row.get(7)?,
                    materials: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT m.template_id, m.catalog_item_id, m.item_code, m.item_name, m.unit,
                   m.quantity_per_unit, m.unit_price
            FROM template_material m
            JOIN unit_template t ON t.id = m.template_id
            WHERE t.project_id = ?1
            ORDER BY m.template_id, m.id
            "#,
        )?;
        let materials = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    TemplateMaterial {
                        catalog_item_id: row.get(1)?,
                        item_code: row.get(2)?,
                        item_name: row.get(3)?,
                        unit: row.get(4)?,
                        quantity_per_unit: row.get(5)?,
                        unit_price: row.get(6)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let positions: HashMap<i64, usize> = templates
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.id, idx))
            .collect();
        for (template_id, material) in materials {
            if let Some(&idx) = positions.get(&template_id) {
                templates[idx].materials.push(material);
            }
        }

        Ok(templates)
    }

    /// 删除户型模板（材料级联删除）
    pub fn delete(&self, template_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM unit_template WHERE id = ?1", params![template_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "UnitTemplate".to_string(),
                id: template_id.to_string(),
            });
        }
        Ok(())
    }
}
