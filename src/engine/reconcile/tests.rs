use super::*;
use crate::domain::boq::{BoqLine, BoqSummary, SteelReport};
use crate::domain::supply::{DeliveredItem, SupplyKey, SupplyTrackingItem};
use crate::domain::types::{BoqSource, CompletionStatus, SupplySource};
use crate::engine::error::AttributionFailure;
use crate::engine::takeoff::BoqResult;

// ==========================================
// 测试辅助函数
// ==========================================

fn line(catalog_item_id: Option<i64>, name: &str, quantity: f64, price: f64, source: BoqSource) -> BoqLine {
    BoqLine {
        catalog_item_id,
        item_code: None,
        item_name: name.to_string(),
        unit: "طن".to_string(),
        quantity,
        unit_price: price,
        total_price: BoqLine::line_total(quantity, price),
        source,
        rule_id: None,
        floor_breakdown: Vec::new(),
    }
}

fn boq(unit_lines: Vec<BoqLine>, area_lines: Vec<BoqLine>) -> BoqResult {
    BoqResult {
        unit_lines,
        area_lines,
        steel_report: SteelReport::default(),
        summary: BoqSummary::default(),
        errors: Vec::new(),
    }
}

fn ledger_item(id: i64, catalog_item_id: Option<i64>, name: &str, required: f64, received: f64) -> SupplyTrackingItem {
    SupplyTrackingItem {
        id: Some(id),
        project_id: 1,
        catalog_item_id,
        item_code: None,
        item_name: name.to_string(),
        unit: "طن".to_string(),
        required_quantity: required,
        received_quantity: received,
        unit_price: 1.0,
        source: SupplySource::Area,
    }
}

fn delivered(name: &str, qty: f64, catalog_item_id: Option<i64>) -> DeliveredItem {
    DeliveredItem {
        item_name: name.to_string(),
        delivered_quantity: qty,
        catalog_item_id,
    }
}

// ==========================================
// sync_from_boq
// ==========================================

#[test]
fn test_sync_inserts_new_items_with_zero_received() {
    let b = boq(
        vec![line(Some(1), "اسمنت", 40.0, 30.0, BoqSource::Unit)],
        vec![line(Some(2), "حديد", 24.0, 900.0, BoqSource::Area)],
    );
    let result = SupplyReconciler::new().sync_from_boq(1, &[], &b);

    assert_eq!(result.inserted_count, 2);
    assert_eq!(result.updated_count, 0);
    assert_eq!(result.ledger.len(), 2);
    assert!(result.ledger.iter().all(|i| i.id.is_none() && i.received_quantity == 0.0));
    assert_eq!(result.ledger[0].source, SupplySource::Quantity);
    assert_eq!(result.ledger[1].source, SupplySource::Area);
}

#[test]
fn test_sync_preserves_received_and_overwrites_required() {
    let existing = vec![ledger_item(10, Some(2), "حديد", 10.0, 7.5)];
    let b = boq(vec![], vec![line(Some(2), "حديد", 24.0, 900.0, BoqSource::Area)]);

    let result = SupplyReconciler::new().sync_from_boq(1, &existing, &b);

    assert_eq!(result.updated_count, 1);
    assert_eq!(result.inserted_count, 0);
    let item = &result.ledger[0];
    assert_eq!(item.id, Some(10));
    assert_eq!(item.required_quantity, 24.0);
    assert_eq!(item.unit_price, 900.0);
    assert_eq!(item.received_quantity, 7.5);
}

#[test]
fn test_sync_sums_lines_sharing_a_key() {
    let b = boq(
        vec![],
        vec![
            line(Some(2), "حديد", 10.0, 900.0, BoqSource::Area),
            line(Some(2), "حديد", 5.5, 950.0, BoqSource::Area),
        ],
    );
    let result = SupplyReconciler::new().sync_from_boq(1, &[], &b);

    assert_eq!(result.ledger.len(), 1);
    assert_eq!(result.ledger[0].required_quantity, 15.5);
    assert_eq!(result.ledger[0].unit_price, 950.0);
}

#[test]
fn test_sync_keeps_small_required_quantity_unrounded() {
    let b = boq(vec![], vec![line(Some(5), "مادة لاصقة", 0.004, 1.0, BoqSource::Area)]);
    let reconciler = SupplyReconciler::new();

    let synced = reconciler.sync_from_boq(1, &[], &b);
    assert_eq!(synced.ledger[0].required_quantity, 0.004);

    let result = reconciler.reconcile_deliveries(&synced.ledger, &[delivered("مادة لاصقة", 0.004, Some(5))]);
    let item = &result.ledger[0];
    assert_eq!(item.received_quantity, 0.004);
    assert_eq!(item.completion_percentage(), 100.0);
    assert_eq!(item.status(), CompletionStatus::Complete);
}

#[test]
fn test_sync_keeps_stale_entries_and_reports_them() {
    let existing = vec![
        ledger_item(1, Some(2), "حديد", 10.0, 3.0),
        ledger_item(2, Some(99), "مادة قديمة", 4.0, 4.0),
    ];
    let b = boq(vec![], vec![line(Some(2), "حديد", 12.0, 1.0, BoqSource::Area)]);

    let result = SupplyReconciler::new().sync_from_boq(1, &existing, &b);

    assert_eq!(result.ledger.len(), 2);
    assert_eq!(result.ledger[1].received_quantity, 4.0);
    assert_eq!(result.stale_keys, vec![SupplyKey::Catalog(99)]);
}

#[test]
fn test_sync_falls_back_to_normalized_name() {
    let existing = vec![ledger_item(1, None, "  Sand   Fine ", 1.0, 2.0)];
    let b = boq(vec![line(None, "sand fine", 8.0, 1.0, BoqSource::Unit)], vec![]);

    let result = SupplyReconciler::new().sync_from_boq(1, &existing, &b);

    assert_eq!(result.ledger.len(), 1);
    assert_eq!(result.ledger[0].required_quantity, 8.0);
    assert_eq!(result.ledger[0].received_quantity, 2.0);
}

#[test]
fn test_sync_is_idempotent() {
    let existing = vec![
        ledger_item(1, Some(2), "حديد", 10.0, 3.0),
        ledger_item(2, None, "رمل", 1.0, 0.5),
    ];
    let b = boq(
        vec![
            line(Some(7), "اسمنت", 40.0, 30.0, BoqSource::Unit),
            line(None, "رمل", 3.333, 5.0, BoqSource::Unit),
        ],
        vec![
            line(Some(2), "حديد", 24.0, 900.0, BoqSource::Area),
            line(None, "بلاط", 100.0, 12.0, BoqSource::Area),
        ],
    );
    let reconciler = SupplyReconciler::new();

    let once = reconciler.sync_from_boq(1, &existing, &b);
    let twice = reconciler.sync_from_boq(1, &once.ledger, &b);

    assert_eq!(once.ledger, twice.ledger);
    assert_eq!(twice.inserted_count, 0);
    assert!(twice.stale_keys.is_empty());
}

// ==========================================
// reconcile_deliveries
// ==========================================

#[test]
fn test_reconcile_resets_then_accumulates() {
    let ledger = vec![
        ledger_item(1, Some(2), "حديد 12 ملم", 20.0, 99.0),
        ledger_item(2, Some(3), "اسمنت", 40.0, 10.0),
    ];
    let items = vec![
        delivered("whatever", 5.0, Some(2)),
        delivered("حديد 12 ملم", 3.0, None),
    ];

    let result = SupplyReconciler::new().reconcile_deliveries(&ledger, &items);

    assert_eq!(result.ledger[0].received_quantity, 8.0);
    assert_eq!(result.ledger[1].received_quantity, 0.0);
    assert_eq!(result.attributed_count, 2);
    assert_eq!(result.unattributed_count(), 0);
    assert_eq!(result.ledger[0].completion_percentage(), 40.0);
}

#[test]
fn test_reconcile_catalog_match_takes_precedence_over_name() {
    let ledger = vec![
        ledger_item(1, Some(5), "اسمنت", 10.0, 0.0),
        ledger_item(2, Some(6), "اسمنت مقاوم", 10.0, 0.0),
    ];
    let items = vec![delivered("اسمنت مقاوم", 4.0, Some(6))];

    let result = SupplyReconciler::new().reconcile_deliveries(&ledger, &items);

    assert_eq!(result.ledger[0].received_quantity, 0.0);
    assert_eq!(result.ledger[1].received_quantity, 4.0);
}

#[test]
fn test_reconcile_substring_picks_first_match() {
    let ledger = vec![
        ledger_item(1, None, "اسمنت", 10.0, 0.0),
        ledger_item(2, None, "اسمنت مقاوم", 10.0, 0.0),
    ];
    let items = vec![delivered("اسمنت مقاوم", 4.0, None)];

    let result = SupplyReconciler::new().reconcile_deliveries(&ledger, &items);

    // "اسمنت" 是 "اسمنت مقاوم" 的子串, 第一条即命中
    assert_eq!(result.ledger[0].received_quantity, 4.0);
    assert_eq!(result.ledger[1].received_quantity, 0.0);
}

#[test]
fn test_reconcile_conservative_fuzzy_match_leaves_unattributed() {
    let ledger = vec![ledger_item(1, None, "حديد 12 ملم", 20.0, 0.0)];
    let items = vec![delivered("حديد 12مم", 5.0, None)];

    let result = SupplyReconciler::new().reconcile_deliveries(&ledger, &items);

    assert_eq!(result.ledger[0].received_quantity, 0.0);
    assert_eq!(result.unattributed_count(), 1);
    assert_eq!(result.unattributed[0].reason, AttributionFailure::NoMatch);
    assert_eq!(result.unattributed[0].item.item_name, "حديد 12مم");
}

#[test]
fn test_reconcile_rejects_invalid_quantities() {
    let ledger = vec![ledger_item(1, Some(1), "حديد", 20.0, 0.0)];
    let items = vec![
        delivered("حديد", -2.0, Some(1)),
        delivered("حديد", f64::NAN, Some(1)),
        delivered("حديد", 2.0, Some(1)),
    ];

    let result = SupplyReconciler::new().reconcile_deliveries(&ledger, &items);

    assert_eq!(result.ledger[0].received_quantity, 2.0);
    assert_eq!(result.unattributed_count(), 2);
    assert!(result
        .unattributed
        .iter()
        .all(|w| w.reason == AttributionFailure::InvalidQuantity));
}

#[test]
fn test_over_delivery_is_visible() {
    let ledger = vec![ledger_item(1, Some(1), "حديد", 10.0, 0.0)];
    let items = vec![delivered("حديد", 8.0, Some(1)), delivered("حديد", 7.0, Some(1))];

    let reconciler = SupplyReconciler::new();
    let result = reconciler.reconcile_deliveries(&ledger, &items);

    assert_eq!(result.ledger[0].completion_percentage(), 150.0);
    let summary = reconciler.summarize(&result.ledger);
    assert_eq!(summary.over_delivered_count, 1);
}
