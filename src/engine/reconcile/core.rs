use crate::domain::supply::{DeliveredItem, SupplyKey, SupplySummary, SupplyTrackingItem};
use crate::domain::types::SupplySource;
use crate::engine::error::{AttributionFailure, UnattributedDeliveryWarning};
use crate::engine::takeoff::BoqResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::matching;

// ==========================================
// 结果类型
// ==========================================

/// BOQ 同步结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplySyncResult {
    pub ledger: Vec<SupplyTrackingItem>,
    pub inserted_count: usize,
    pub updated_count: usize,
    /// 台账中存在但最新 BOQ 中已不存在的键 (不自动删除)
    pub stale_keys: Vec<SupplyKey>,
}

/// 到货对账结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReconcileResult {
    pub ledger: Vec<SupplyTrackingItem>,
    pub attributed_count: usize,
    pub unattributed: Vec<UnattributedDeliveryWarning>,
}

impl DeliveryReconcileResult {
    pub fn unattributed_count(&self) -> usize {
        self.unattributed.len()
    }
}

/// 同一台账键下汇总后的需求
struct Demand {
    key: SupplyKey,
    catalog_item_id: Option<i64>,
    item_code: Option<String>,
    item_name: String,
    unit: String,
    quantity: f64,
    unit_price: f64,
    source: SupplySource,
}

// ==========================================
// SupplyReconciler - 供应对账器
// ==========================================
// 无状态,所有数据通过参数传入并以新值返回
#[derive(Debug, Clone, Default)]
pub struct SupplyReconciler;

impl SupplyReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 按 BOQ 同步台账 (upsert)
    ///
    /// 规则:
    /// 1) 键: catalog_item_id > item_code > 规范化名称
    /// 2) 同键的多条 BOQ 行先求和 (面积规则不合并,但台账按物料合并)
    /// 3) 已存在: 覆盖 required_quantity / unit_price, 保留 received_quantity
    /// 4) 不存在: 新增, received_quantity = 0
    /// 5) BOQ 中已消失的台账行保留,并在 stale_keys 中报告
    pub fn sync_from_boq(
        &self,
        project_id: i64,
        existing: &[SupplyTrackingItem],
        boq: &BoqResult,
    ) -> SupplySyncResult {
        let demands = collect_demands(boq);

        let mut ledger = existing.to_vec();
        let mut index: HashMap<SupplyKey, usize> = HashMap::with_capacity(ledger.len());
        for (idx, item) in ledger.iter().enumerate() {
            index.entry(item.key()).or_insert(idx);
        }

        let mut touched = vec![false; ledger.len()];
        let mut inserted_count = 0;
        let mut updated_count = 0;

        for demand in demands {
            // 需求数量保持清单原值,仅展示时取整
            let required_quantity = demand.quantity;
            match index.get(&demand.key) {
                Some(&idx) => {
                    let item = &mut ledger[idx];
                    item.required_quantity = required_quantity;
                    item.unit_price = demand.unit_price;
                    touched[idx] = true;
                    updated_count += 1;
                }
                None => {
                    ledger.push(SupplyTrackingItem {
                        id: None,
                        project_id,
                        catalog_item_id: demand.catalog_item_id,
                        item_code: demand.item_code,
                        item_name: demand.item_name,
                        unit: demand.unit,
                        required_quantity,
                        received_quantity: 0.0,
                        unit_price: demand.unit_price,
                        source: demand.source,
                    });
                    inserted_count += 1;
                }
            }
        }

        let stale_keys = existing
            .iter()
            .zip(touched.iter())
            .filter(|(_, was_touched)| !**was_touched)
            .map(|(item, _)| item.key())
            .collect();

        SupplySyncResult {
            ledger,
            inserted_count,
            updated_count,
            stale_keys,
        }
    }

    /// 按已到货采购订单行重算到货量
    ///
    /// 规则:
    /// 1) 所有台账行 received_quantity 先清零
    /// 2) 逐行匹配: catalog_item_id 相等优先, 否则名称双向子串
    /// 3) 命中第一条即累加 delivered_quantity
    /// 4) 未命中或数量非法的到货行计入 unattributed
    pub fn reconcile_deliveries(
        &self,
        ledger: &[SupplyTrackingItem],
        delivered_items: &[DeliveredItem],
    ) -> DeliveryReconcileResult {
        let mut ledger = ledger.to_vec();
        for item in ledger.iter_mut() {
            item.received_quantity = 0.0;
        }

        let mut attributed_count = 0;
        let mut unattributed = Vec::new();

        for delivered in delivered_items {
            let qty = delivered.delivered_quantity;
            if !qty.is_finite() || qty < 0.0 {
                unattributed.push(UnattributedDeliveryWarning {
                    item: delivered.clone(),
                    reason: AttributionFailure::InvalidQuantity,
                });
                continue;
            }

            match matching::find_ledger_index(&ledger, delivered) {
                Some(idx) => {
                    ledger[idx].received_quantity += qty;
                    attributed_count += 1;
                }
                None => unattributed.push(UnattributedDeliveryWarning {
                    item: delivered.clone(),
                    reason: AttributionFailure::NoMatch,
                }),
            }
        }

        DeliveryReconcileResult {
            ledger,
            attributed_count,
            unattributed,
        }
    }

    /// 台账汇总
    pub fn summarize(&self, ledger: &[SupplyTrackingItem]) -> SupplySummary {
        SupplySummary::from_ledger(ledger)
    }
}

/// 按台账键汇总 BOQ 行 (保持首次出现顺序, 单价后写覆盖)
fn collect_demands(boq: &BoqResult) -> Vec<Demand> {
    let mut demands: Vec<Demand> = Vec::new();
    let mut index: HashMap<SupplyKey, usize> = HashMap::new();

    for line in boq.lines() {
        let key = SupplyKey::derive(line.catalog_item_id, line.item_code.as_deref(), &line.item_name);
        match index.get(&key) {
            Some(&idx) => {
                let demand = &mut demands[idx];
                demand.quantity += line.quantity;
                demand.unit_price = line.unit_price;
            }
            None => {
                index.insert(key.clone(), demands.len());
                demands.push(Demand {
                    key,
                    catalog_item_id: line.catalog_item_id,
                    item_code: line.item_code.clone(),
                    item_name: line.item_name.clone(),
                    unit: line.unit.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    source: line.source.supply_source(),
                });
            }
        }
    }

    demands
}
