// ==========================================
// 工程量计算引擎 - 供应台账领域模型
// ==========================================
// 职责: 需求量 / 到货量 / 剩余量 / 完成率
// 红线: 完成率不封顶 100,超量到货必须可见
// ==========================================

use crate::domain::types::{round_dp, CompletionStatus, SupplySource};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SupplyTrackingItem - 供应台账行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyTrackingItem {
    pub id: Option<i64>, // 新增行落库前为 None
    pub project_id: i64,
    pub catalog_item_id: Option<i64>,
    pub item_code: Option<String>,
    pub item_name: String,
    pub unit: String,
    pub required_quantity: f64,
    pub received_quantity: f64,
    pub unit_price: f64,
    pub source: SupplySource,
}

impl SupplyTrackingItem {
    /// 完成百分比 (一位小数, 不封顶)
    pub fn completion_percentage(&self) -> f64 {
        if self.required_quantity == 0.0 {
            return 0.0;
        }
        round_dp(self.received_quantity / self.required_quantity * 100.0, 1)
    }

    /// 剩余需求量 (超量到货时为 0)
    pub fn remaining_quantity(&self) -> f64 {
        (self.required_quantity - self.received_quantity).max(0.0)
    }

    pub fn status(&self) -> CompletionStatus {
        CompletionStatus::from_percentage(self.completion_percentage())
    }

    pub fn key(&self) -> SupplyKey {
        SupplyKey::derive(self.catalog_item_id, self.item_code.as_deref(), &self.item_name)
    }
}

// ==========================================
// SupplyKey - 台账键
// ==========================================
// 优先级: catalog_item_id > item_code > 规范化名称
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SupplyKey {
    Catalog(i64),
    Code(String),
    Name(String),
}

impl SupplyKey {
    pub fn derive(catalog_item_id: Option<i64>, item_code: Option<&str>, item_name: &str) -> Self {
        if let Some(id) = catalog_item_id {
            return SupplyKey::Catalog(id);
        }
        match item_code.map(str::trim) {
            Some(code) if !code.is_empty() => SupplyKey::Code(code.to_string()),
            _ => SupplyKey::Name(normalize_item_name(item_name)),
        }
    }
}

impl fmt::Display for SupplyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyKey::Catalog(id) => write!(f, "catalog:{}", id),
            SupplyKey::Code(code) => write!(f, "code:{}", code),
            SupplyKey::Name(name) => write!(f, "name:{}", name),
        }
    }
}

/// 名称规范化: 去首尾空白、合并内部空白、小写
pub fn normalize_item_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ==========================================
// DeliveredItem - 已到货采购订单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveredItem {
    pub item_name: String,
    pub delivered_quantity: f64,
    pub catalog_item_id: Option<i64>,
}

// ==========================================
// SupplySummary - 台账汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplySummary {
    pub item_count: usize,
    pub not_started_count: usize,
    pub partial_count: usize,
    pub complete_count: usize,
    pub over_delivered_count: usize,
    pub required_value: f64,
    pub received_value: f64,
    pub overall_completion_pct: f64, // 按金额加权
}

impl SupplySummary {
    pub fn from_ledger(ledger: &[SupplyTrackingItem]) -> Self {
        let mut summary = SupplySummary {
            item_count: ledger.len(),
            ..Default::default()
        };

        for item in ledger {
            match item.status() {
                CompletionStatus::NotStarted => summary.not_started_count += 1,
                CompletionStatus::Partial => summary.partial_count += 1,
                CompletionStatus::Complete => summary.complete_count += 1,
                CompletionStatus::OverDelivered => summary.over_delivered_count += 1,
            }
            summary.required_value += item.required_quantity * item.unit_price;
            summary.received_value += item.received_quantity * item.unit_price;
        }

        if summary.required_value > 0.0 {
            summary.overall_completion_pct =
                round_dp(summary.received_value / summary.required_value * 100.0, 1);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(required: f64, received: f64) -> SupplyTrackingItem {
        SupplyTrackingItem {
            id: Some(1),
            project_id: 1,
            catalog_item_id: Some(5),
            item_code: None,
            item_name: "حديد 12 ملم".to_string(),
            unit: "طن".to_string(),
            required_quantity: required,
            received_quantity: received,
            unit_price: 100.0,
            source: SupplySource::Area,
        }
    }

    #[test]
    fn test_completion_percentage_zero_required() {
        assert_eq!(item(0.0, 5.0).completion_percentage(), 0.0);
    }

    #[test]
    fn test_completion_percentage_rounds_to_one_decimal_and_exceeds_100() {
        assert_eq!(item(3.0, 1.0).completion_percentage(), 33.3);
        assert_eq!(item(10.0, 13.0).completion_percentage(), 130.0);
        assert_eq!(item(10.0, 13.0).status(), CompletionStatus::OverDelivered);
        assert_eq!(item(10.0, 13.0).remaining_quantity(), 0.0);
    }

    #[test]
    fn test_completion_is_monotonic_in_received() {
        let mut last = -1.0;
        for received in [0.0, 0.5, 1.0, 4.9, 5.0, 9.99, 10.0, 25.0] {
            let pct = item(10.0, received).completion_percentage();
            assert!(pct >= last);
            last = pct;
        }
    }

    #[test]
    fn test_key_priority() {
        assert_eq!(SupplyKey::derive(Some(3), Some("X"), "a"), SupplyKey::Catalog(3));
        assert_eq!(SupplyKey::derive(None, Some(" X "), "a"), SupplyKey::Code("X".to_string()));
        assert_eq!(
            SupplyKey::derive(None, Some(""), "  Steel   Bar "),
            SupplyKey::Name("steel bar".to_string())
        );
    }

    #[test]
    fn test_summary_value_weighted() {
        let ledger = vec![item(10.0, 5.0), item(10.0, 0.0), item(0.0, 0.0)];
        let summary = SupplySummary::from_ledger(&ledger);

        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.partial_count, 1);
        assert_eq!(summary.not_started_count, 2);
        assert_eq!(summary.required_value, 2000.0);
        assert_eq!(summary.received_value, 500.0);
        assert_eq!(summary.overall_completion_pct, 25.0);
    }
}
