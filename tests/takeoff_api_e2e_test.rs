// ==========================================
// API 层端到端测试
// ==========================================
// 测试目标: 落库数据 → 计算清单 → 同步台账 → 到货对账 → 报表
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use quantity_takeoff::api::{ApiError, BuildingQuantityApi};
use quantity_takeoff::config::{config_keys, ConfigManager, ConfigScope};
use quantity_takeoff::domain::types::CompletionStatus;
use quantity_takeoff::engine::AttributionFailure;
use quantity_takeoff::repository::{
    AreaRuleRepository, DeliveryRepository, FloorRepository, PurchaseOrderLineEntity,
    UnitTemplateRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::{approx, factor_rule, floor, material, template, tiling_rule};

/// 项目 1: 两层楼 (300 m²), 一个户型模板, 一条有效规则 + 一条配置错误的规则
fn seed_project(conn: &Arc<Mutex<Connection>>) {
    FloorRepository::from_connection(conn.clone())
        .batch_insert(1, &[floor(0, 1, 200.0, None), floor(0, 2, 100.0, None)])
        .unwrap();

    UnitTemplateRepository::from_connection(conn.clone())
        .insert(&template(0, 10, vec![material(Some(3), None, "بلوك", 12.0, 2.0)]))
        .unwrap();

    let rules = AreaRuleRepository::from_connection(conn.clone());
    rules.insert(&factor_rule(0, "خرسانة", 0.1, 0.0, 250.0)).unwrap();
    let mut broken = tiling_rule(0, 1, 60.0, 60.0, 0.0);
    broken.selected_floor_id = None;
    rules.insert(&broken).unwrap();
}

fn po_line(po: &str, status: &str, catalog_item_id: Option<i64>, name: &str, qty: f64) -> PurchaseOrderLineEntity {
    PurchaseOrderLineEntity {
        id: None,
        project_id: 1,
        po_number: po.to_string(),
        status: status.to_string(),
        catalog_item_id,
        item_name: name.to_string(),
        delivered_quantity: qty,
        delivered_at: NaiveDate::from_ymd_opt(2026, 3, 15),
    }
}

fn setup() -> (tempfile::NamedTempFile, Arc<Mutex<Connection>>, BuildingQuantityApi) {
    let (temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::shared_connection(&db_path);
    seed_project(&conn);
    let api = BuildingQuantityApi::from_connection(conn.clone()).unwrap();
    (temp_file, conn, api)
}

// ==========================================
// 计算 + 快照
// ==========================================

#[test]
fn test_calculate_persists_snapshot_and_reports_rule_errors() {
    let (_temp_file, _conn, api) = setup();

    let response = api.calculate(1).unwrap();
    let boq = &response.boq;

    assert_eq!(boq.unit_lines.len(), 1);
    assert_eq!(boq.area_lines.len(), 1);
    assert_eq!(boq.errors.len(), 1);
    // 120 × 2 + 30 × 250
    assert!(approx(boq.total_cost(), 7_740.0));
    assert!(approx(boq.steel_report.total_kg, 30_000.0));

    let snapshot = api.latest_boq_snapshot(1).unwrap();
    assert_eq!(snapshot.snapshot_id, response.snapshot_id);
    assert_eq!(snapshot.lines.len(), 2);
    assert_eq!(snapshot.rule_error_count, 1);
    assert!(approx(snapshot.total_cost, 7_740.0));
}

#[test]
fn test_snapshot_missing_project_is_not_found() {
    let (_temp_file, _conn, api) = setup();

    let result = api.latest_boq_snapshot(99);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_project_steel_factor_overrides_global() {
    let (_temp_file, conn, api) = setup();
    let config = ConfigManager::from_connection(conn).unwrap();
    config
        .set_config_value(&ConfigScope::Global, config_keys::DEFAULT_STEEL_FACTOR, "80")
        .unwrap();

    let boq = api.calculate(1).unwrap().boq;
    assert!(approx(boq.steel_report.total_kg, 24_000.0));

    config
        .set_config_value(
            &ConfigScope::Project { project_id: 1 },
            config_keys::DEFAULT_STEEL_FACTOR,
            "120",
        )
        .unwrap();
    let boq = api.calculate(1).unwrap().boq;
    assert!(approx(boq.steel_report.total_kg, 36_000.0));

    let snapshot = api.latest_boq_snapshot(1).unwrap();
    assert!(snapshot.config_snapshot_json.unwrap().contains("120"));
}

#[test]
fn test_negative_floor_area_maps_to_validation_error() {
    let (_temp_file, conn, api) = setup();
    FloorRepository::from_connection(conn)
        .insert(2, 1, "خطأ", -5.0, None)
        .unwrap();

    match api.calculate(2) {
        Err(ApiError::InputValidationError { violations, .. }) => {
            assert_eq!(violations.len(), 1);
        }
        other => panic!("Expected InputValidationError, got {:?}", other.map(|r| r.snapshot_id)),
    }
}

// ==========================================
// 台账同步 + 到货对账
// ==========================================

#[test]
fn test_full_supply_cycle() {
    let (_temp_file, conn, api) = setup();

    let sync = api.sync_supply(1).unwrap();
    assert_eq!(sync.inserted_count, 2);
    assert_eq!(sync.rule_error_count, 1);
    assert!(sync.stale_keys.is_empty());
    assert!(sync.ledger.iter().all(|item| item.id.is_some()));

    DeliveryRepository::from_connection(conn)
        .batch_insert(&[
            po_line("PO-1", "Delivered", Some(3), "بلوك أحمر", 60.0),
            po_line("PO-2", "received", None, "خرسانة", 10.0),
            po_line("PO-3", "pending", Some(3), "بلوك", 100.0),
            po_line("PO-4", "completed", None, "حديد", 5.0),
        ])
        .unwrap();

    let delivery = api.sync_supply_from_delivery(1).unwrap();
    assert_eq!(delivery.delivered_line_count, 3);
    assert_eq!(delivery.attributed_count, 2);
    assert_eq!(delivery.unattributed_count, 1);
    assert_eq!(delivery.unattributed[0].reason, AttributionFailure::NoMatch);

    // 重复对账结果不变 (已收数量先清零)
    let again = api.sync_supply_from_delivery(1).unwrap();
    assert_eq!(again.ledger, delivery.ledger);

    let report = api.supply_report(1).unwrap();
    assert_eq!(report.items.len(), 2);

    let block = &report.items[0];
    assert!(approx(block.item.required_quantity, 120.0));
    assert!(approx(block.item.received_quantity, 60.0));
    assert!(approx(block.completion_percentage, 50.0));
    assert!(approx(block.remaining_quantity, 60.0));
    assert_eq!(block.status, CompletionStatus::Partial);

    let concrete = &report.items[1];
    assert!(approx(concrete.item.required_quantity, 30.0));
    assert!(approx(concrete.completion_percentage, 33.3));

    assert_eq!(report.summary.partial_count, 2);
    // (60×2 + 10×250) / (120×2 + 30×250)
    assert!(approx(report.summary.received_value, 2_620.0));
    assert!(approx(report.summary.required_value, 7_740.0));
}

#[test]
fn test_resync_preserves_received_quantity() {
    let (_temp_file, conn, api) = setup();
    api.sync_supply(1).unwrap();

    DeliveryRepository::from_connection(conn.clone())
        .batch_insert(&[po_line("PO-1", "delivered", Some(3), "بلوك", 30.0)])
        .unwrap();
    api.sync_supply_from_delivery(1).unwrap();

    // 户型数量调整后重新同步
    let templates = UnitTemplateRepository::from_connection(conn);
    let template_id = templates.find_by_project(1).unwrap()[0].id;
    templates.update_unit_count(template_id, 20).unwrap();

    let resync = api.sync_supply(1).unwrap();
    assert_eq!(resync.inserted_count, 0);
    assert_eq!(resync.updated_count, 2);

    let block = &resync.ledger[0];
    assert!(approx(block.required_quantity, 240.0));
    assert!(approx(block.received_quantity, 30.0));
}

#[test]
fn test_removed_rule_is_reported_stale_not_deleted() {
    let (_temp_file, conn, api) = setup();
    api.sync_supply(1).unwrap();

    let rules = AreaRuleRepository::from_connection(conn);
    for rule in rules.find_by_project(1).unwrap() {
        rules.delete(rule.id).unwrap();
    }

    let resync = api.sync_supply(1).unwrap();
    assert_eq!(resync.stale_keys.len(), 1);
    assert_eq!(resync.ledger.len(), 2);
    assert_eq!(api.supply_report(1).unwrap().items.len(), 2);
}

#[test]
fn test_custom_delivered_statuses() {
    let (_temp_file, conn, api) = setup();
    api.sync_supply(1).unwrap();

    DeliveryRepository::from_connection(conn.clone())
        .batch_insert(&[
            po_line("PO-1", "delivered", Some(3), "بلوك", 30.0),
            po_line("PO-2", "partially_received", Some(3), "بلوك", 12.0),
        ])
        .unwrap();

    ConfigManager::from_connection(conn)
        .unwrap()
        .set_config_value(
            &ConfigScope::Project { project_id: 1 },
            config_keys::DELIVERED_PO_STATUSES,
            "Partially_Received",
        )
        .unwrap();

    let delivery = api.sync_supply_from_delivery(1).unwrap();
    assert_eq!(delivery.delivered_line_count, 1);
    assert!(approx(delivery.ledger[0].received_quantity, 12.0));
}
