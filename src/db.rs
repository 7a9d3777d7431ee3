// ==========================================
// 工程量计算引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供建表脚本 (楼层/户型/面积规则/供应台账/到货/清单快照/配置)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS building_floor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    floor_number INTEGER NOT NULL,
    floor_name TEXT NOT NULL,
    area REAL NOT NULL DEFAULT 0,
    steel_factor REAL
);
CREATE INDEX IF NOT EXISTS idx_building_floor_project ON building_floor(project_id);

CREATE TABLE IF NOT EXISTS unit_template (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    area REAL NOT NULL DEFAULT 0,
    rooms_count INTEGER NOT NULL DEFAULT 0,
    bathrooms_count INTEGER NOT NULL DEFAULT 0,
    unit_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_unit_template_project ON unit_template(project_id);

CREATE TABLE IF NOT EXISTS template_material (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id INTEGER NOT NULL REFERENCES unit_template(id) ON DELETE CASCADE,
    catalog_item_id INTEGER,
    item_code TEXT,
    item_name TEXT NOT NULL,
    unit TEXT NOT NULL,
    quantity_per_unit REAL NOT NULL DEFAULT 0,
    unit_price REAL NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_template_material_template ON template_material(template_id);

CREATE TABLE IF NOT EXISTS area_material_rule (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    catalog_item_id INTEGER,
    item_name TEXT NOT NULL,
    unit TEXT NOT NULL,
    calculation_method TEXT NOT NULL DEFAULT 'factor',
    factor REAL NOT NULL DEFAULT 0,
    direct_quantity REAL NOT NULL DEFAULT 0,
    unit_price REAL NOT NULL DEFAULT 0,
    calculation_type TEXT NOT NULL DEFAULT 'all_floors',
    selected_floor_id INTEGER,
    tile_width_cm REAL NOT NULL DEFAULT 0,
    tile_height_cm REAL NOT NULL DEFAULT 0,
    waste_percentage REAL NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_area_material_rule_project ON area_material_rule(project_id);

CREATE TABLE IF NOT EXISTS supply_tracking (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    catalog_item_id INTEGER,
    item_code TEXT,
    item_name TEXT NOT NULL,
    unit TEXT NOT NULL,
    required_quantity REAL NOT NULL DEFAULT 0,
    received_quantity REAL NOT NULL DEFAULT 0,
    unit_price REAL NOT NULL DEFAULT 0,
    source TEXT NOT NULL DEFAULT 'quantity',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_supply_tracking_project ON supply_tracking(project_id);

CREATE TABLE IF NOT EXISTS purchase_order_line (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    po_number TEXT NOT NULL,
    status TEXT NOT NULL,
    catalog_item_id INTEGER,
    item_name TEXT NOT NULL,
    delivered_quantity REAL NOT NULL DEFAULT 0,
    delivered_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_purchase_order_line_project ON purchase_order_line(project_id);

CREATE TABLE IF NOT EXISTS boq_snapshot (
    snapshot_id TEXT PRIMARY KEY,
    project_id INTEGER NOT NULL,
    total_cost REAL NOT NULL,
    rule_error_count INTEGER NOT NULL DEFAULT 0,
    config_snapshot_json TEXT,
    calculated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_boq_snapshot_project ON boq_snapshot(project_id);

CREATE TABLE IF NOT EXISTS boq_snapshot_line (
    snapshot_id TEXT NOT NULL REFERENCES boq_snapshot(snapshot_id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    source TEXT NOT NULL,
    rule_id INTEGER,
    catalog_item_id INTEGER,
    item_code TEXT,
    item_name TEXT NOT NULL,
    unit TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit_price REAL NOT NULL,
    total_price REAL NOT NULL,
    floor_breakdown_json TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (snapshot_id, line_no)
);
"#;
