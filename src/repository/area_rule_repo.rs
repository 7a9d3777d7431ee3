use crate::db::open_sqlite_connection;
use crate::domain::area_rule::AreaMaterialRule;
use crate::domain::types::{CalculationMethod, CalculationType};
use crate::repository::error::{parse_enum, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AreaRuleRepository - 面积材料规则仓储
// ==========================================
/// 面积材料规则仓储
/// 职责: 管理 area_material_rule 表
/// 存储: calculation_method / calculation_type 以 snake_case 文本存储
pub struct AreaRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 数据库原始行 (枚举字段尚未解析)
struct AreaRuleRow {
    rule: AreaMaterialRule,
    calculation_method: String,
    calculation_type: String,
}

impl AreaRuleRepository {
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

    /// 新增面积材料规则
    ///
    /// # 返回
    /// - Ok(i64): 新规则 id
    pub fn insert(&self, rule: &AreaMaterialRule) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO area_material_rule (
                project_id, catalog_item_id, item_name, unit,
                calculation_method, factor, direct_quantity, unit_price,
                calculation_type, selected_floor_id,
                tile_width_cm, tile_height_cm, waste_percentage
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                rule.project_id,
                rule.catalog_item_id,
                rule.item_name,
                rule.unit,
                rule.calculation_method.to_db_str(),
                rule.factor,
                rule.direct_quantity,
                rule.unit_price,
                rule.calculation_type.to_db_str(),
                rule.selected_floor_id,
                rule.tile_width_cm,
                rule.tile_height_cm,
                rule.waste_percentage,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按项目查询面积材料规则（按 id 排序）
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<AreaMaterialRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, catalog_item_id, item_name, unit,
                   calculation_method, factor, direct_quantity, unit_price,
                   calculation_type, selected_floor_id,
                   tile_width_cm, tile_height_cm, waste_percentage
            FROM area_material_rule
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(AreaRuleRow {
                    rule: AreaMaterialRule {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        catalog_item_id: row.get(2)?,
                        item_name: row.get(3)?,
                        unit: row.get(4)?,
                        calculation_method: CalculationMethod::Factor,
                        factor: row.get(6)?,
                        direct_quantity: row.get(7)?,
                        unit_price: row.get(8)?,
                        calculation_type: CalculationType::AllFloors,
                        selected_floor_id: row.get(10)?,
                        tile_width_cm: row.get(11)?,
                        tile_height_cm: row.get(12)?,
                        waste_percentage: row.get(13)?,
                    },
                    calculation_method: row.get(5)?,
                    calculation_type: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| {
                let mut rule = row.rule;
                rule.calculation_method = parse_enum(
                    "calculation_method",
                    &row.calculation_method,
                    CalculationMethod::from_str,
                )?;
                rule.calculation_type = parse_enum(
                    "calculation_type",
                    &row.calculation_type,
                    CalculationType::from_str,
                )?;
                Ok(rule)
            })
            .collect()
    }

    /// 删除规则
    pub fn delete(&self, rule_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM area_material_rule WHERE id = ?1", params![rule_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AreaMaterialRule".to_string(),
                id: rule_id.to_string(),
            });
        }
        Ok(())
    }
}
