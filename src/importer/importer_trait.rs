// ==========================================
// 工程量计算引擎 - 导入接口定义
// ==========================================
// 职责: 定义文件解析与字段映射接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

/// 原始行: 表头 → 单元格文本 (已 trim)
pub type RawRecord = HashMap<String, String>;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 读取文件为原始行
// 实现者: CsvParser / ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行列表
    ///
    /// # 说明
    /// - 第一行为表头
    /// - 完全空白的行被跳过
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// RecordMapper Trait
// ==========================================
// 用途: 原始行 → 领域记录
// 实现者: FloorFieldMapper / DeliveryFieldMapper
pub trait RecordMapper: Send + Sync {
    type Output;

    /// 必需列 (标准列名),任何别名均可满足
    fn required_columns(&self) -> &'static [&'static str];

    /// 映射单行
    ///
    /// # 参数
    /// - row_number: 文件中的行号（表头为第 1 行）
    fn map_record(&self, row: &RawRecord, row_number: usize) -> ImportResult<Self::Output>;
}
