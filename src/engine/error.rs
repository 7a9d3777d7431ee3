// ==========================================
// 工程量计算引擎 - 引擎错误类型
// ==========================================
// 分级:
// - ValidationError: 输入级,整次调用中止
// - RuleConfigurationError: 规则级,仅影响单行,随结果返回
// - UnattributedDeliveryWarning: 非致命,随台账返回供人工复核
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::area_rule::RuleConfigIssue;
use crate::domain::supply::DeliveredItem;
use crate::domain::validation::InputViolation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 输入校验错误 (负面积/负户数等)
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("输入校验失败: {} 项违规", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<InputViolation>,
}

/// 单条面积规则配置错误
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("规则配置错误 (rule_id={rule_id}, item={item_name}): {issue}")]
pub struct RuleConfigurationError {
    pub rule_id: i64,
    pub item_name: String,
    pub issue: RuleConfigIssue,
}

/// 到货行无法归属的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributionFailure {
    NoMatch,         // 编码与名称均未匹配
    InvalidQuantity, // 到货数量为负或非有限值
}

/// 未归属到货提示
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("到货行未归属: item={}, qty={} ({:?})", .item.item_name, .item.delivered_quantity, .reason)]
pub struct UnattributedDeliveryWarning {
    pub item: DeliveredItem,
    pub reason: AttributionFailure,
}

/// 引擎错误 (仅输入级错误会中止调用)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
