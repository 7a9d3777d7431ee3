// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use quantity_takeoff::db::{init_schema, open_sqlite_connection};
use quantity_takeoff::domain::{AreaMaterialRule, Floor, TemplateMaterial, UnitTemplate};
use quantity_takeoff::domain::types::{CalculationMethod, CalculationType};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（仓储 from_connection 使用）
pub fn shared_connection(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = open_sqlite_connection(db_path).expect("open test db");
    Arc::new(Mutex::new(conn))
}

// ==========================================
// 测试数据构造
// ==========================================

pub fn floor(id: i64, number: i32, area: f64, steel_factor: Option<f64>) -> Floor {
    Floor {
        id,
        project_id: 1,
        floor_number: number,
        floor_name: format!("الطابق {}", number),
        area,
        steel_factor,
    }
}

pub fn material(catalog_item_id: Option<i64>, code: Option<&str>, name: &str, qty: f64, price: f64) -> TemplateMaterial {
    TemplateMaterial {
        catalog_item_id,
        item_code: code.map(str::to_string),
        item_name: name.to_string(),
        unit: "كيس".to_string(),
        quantity_per_unit: qty,
        unit_price: price,
    }
}

pub fn template(id: i64, unit_count: i64, materials: Vec<TemplateMaterial>) -> UnitTemplate {
    UnitTemplate {
        id,
        project_id: 1,
        code: format!("T{}", id),
        name: format!("نموذج {}", id),
        area: 120.0,
        rooms_count: 3,
        bathrooms_count: 2,
        unit_count,
        materials,
    }
}

pub fn factor_rule(id: i64, name: &str, factor: f64, waste: f64, price: f64) -> AreaMaterialRule {
    AreaMaterialRule {
        id,
        project_id: 1,
        catalog_item_id: Some(500 + id),
        item_name: name.to_string(),
        unit: "م3".to_string(),
        calculation_method: CalculationMethod::Factor,
        factor,
        direct_quantity: 0.0,
        unit_price: price,
        calculation_type: CalculationType::AllFloors,
        selected_floor_id: None,
        tile_width_cm: 0.0,
        tile_height_cm: 0.0,
        waste_percentage: waste,
    }
}

pub fn tiling_rule(id: i64, floor_id: i64, width_cm: f64, height_cm: f64, waste: f64) -> AreaMaterialRule {
    AreaMaterialRule {
        id,
        project_id: 1,
        catalog_item_id: Some(900 + id),
        item_name: "بلاط 60×60".to_string(),
        unit: "قطعة".to_string(),
        calculation_method: CalculationMethod::Factor,
        factor: 0.0,
        direct_quantity: 0.0,
        unit_price: 12.5,
        calculation_type: CalculationType::SelectedFloor,
        selected_floor_id: Some(floor_id),
        tile_width_cm: width_cm,
        tile_height_cm: height_cm,
        waste_percentage: waste,
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
