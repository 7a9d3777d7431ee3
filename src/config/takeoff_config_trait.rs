// ==========================================
// 工程量计算引擎 - 计算配置读取 Trait
// ==========================================
// 职责: 定义 API 层计算/对账所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// TakeoffConfigReader Trait
// ==========================================
// 用途: 计算与对账所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait TakeoffConfigReader: Send + Sync {
    /// 获取项目默认含钢量 (kg/m²)
    ///
    /// # 返回
    /// - 项目覆写 > 全局配置 > 默认值
    /// - 非正数或无法解析时使用默认值
    ///
    /// # 默认值
    /// - 100
    fn default_steel_factor(&self, project_id: i64) -> Result<f64, Box<dyn Error>>;

    /// 获取视为已到货的采购订单状态列表（小写）
    ///
    /// # 默认值
    /// - ["delivered", "received", "completed"]
    fn delivered_po_statuses(&self, project_id: i64) -> Result<Vec<String>, Box<dyn Error>>;
}
