// ==========================================
// 工程量计算引擎 - 供应对账台账
// ==========================================
// 输入: 现有台账 + BOQ / 已到货采购订单行
// 输出: 新台账 (需求量 / 到货量 / 完成率)
// ==========================================
// 红线: 同步保留到货量; 到货重算先清零再累加
// 红线: 同一项目的台账读改写必须由调用方串行化
// ==========================================

mod core;
mod matching;

#[cfg(test)]
mod tests;

pub use self::core::{DeliveryReconcileResult, SupplyReconciler, SupplySyncResult};
