// ==========================================
// 工程量计算引擎 - 工程量汇总器
// ==========================================
// 输入: 楼层 + 户型模板 + 面积材料规则
// 输出: 户型材料合并行 + 面积材料行 (含分楼层明细) + 含钢量报告
// ==========================================
// 红线: 纯计算,无 I/O,无时钟,相同输入得到相同输出
// 红线: 单条规则配置错误不得中止整张清单
// ==========================================

mod area;
mod core;
mod steel;


pub use self::area::area_quantity;
pub use self::core::{BoqResult, QuantityTakeoffAggregator};
