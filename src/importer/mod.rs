// ==========================================
// 工程量计算引擎 - 导入层
// ==========================================
// 职责: 外部数据导入 (楼层 / 到货采购订单行)
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod project_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{DeliveryFieldMapper, FloorFieldMapper};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::{FileParser, RawRecord, RecordMapper};
pub use project_importer::{ImportSummary, ProjectImporter, RejectedRow};
