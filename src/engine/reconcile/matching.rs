use crate::domain::supply::{DeliveredItem, SupplyTrackingItem};

/// 到货行名称与台账名称是否匹配
///
/// 区分大小写的双向子串匹配; 空名称不参与匹配
fn names_match(delivered_name: &str, ledger_name: &str) -> bool {
    let delivered_name = delivered_name.trim();
    let ledger_name = ledger_name.trim();
    if delivered_name.is_empty() || ledger_name.is_empty() {
        return false;
    }
    ledger_name.contains(delivered_name) || delivered_name.contains(ledger_name)
}

/// 为到货行查找台账行下标
///
/// 先按 catalog_item_id 精确匹配; 未命中再按名称子串匹配,取第一条
pub(super) fn find_ledger_index(ledger: &[SupplyTrackingItem], delivered: &DeliveredItem) -> Option<usize> {
    if let Some(catalog_id) = delivered.catalog_item_id {
        if let Some(idx) = ledger
            .iter()
            .position(|item| item.catalog_item_id == Some(catalog_id))
        {
            return Some(idx);
        }
    }

    ledger
        .iter()
        .position(|item| names_match(&delivered.item_name, &item.item_name))
}
