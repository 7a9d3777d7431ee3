// ==========================================
// 工程量计算引擎 - 项目数据导入器
// ==========================================
// 流程: 文件解析 → 必需列检查 → 逐行映射 → 合格行单事务落库
// 红线: 行级错误不中断导入,全部记录在汇总中
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{has_column, DeliveryFieldMapper, FloorFieldMapper};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{RawRecord, RecordMapper};
use crate::repository::delivery_repo::DeliveryRepository;
use crate::repository::floor_repo::FloorRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 被拒绝的行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row_number: usize,
    pub reason: String,
}

/// 导入汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported_rows: usize,
    pub rejected: Vec<RejectedRow>,
    pub elapsed_ms: u64,
}

// ==========================================
// ProjectImporter
// ==========================================
pub struct ProjectImporter {
    floor_repo: Arc<FloorRepository>,
    delivery_repo: Arc<DeliveryRepository>,
}

impl ProjectImporter {
    pub fn new(floor_repo: Arc<FloorRepository>, delivery_repo: Arc<DeliveryRepository>) -> Self {
        Self {
            floor_repo,
            delivery_repo,
        }
    }

    /// 导入楼层
    pub fn import_floors<P: AsRef<Path>>(&self, project_id: i64, file_path: P) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let records = UniversalFileParser.parse(file_path.as_ref())?;
        let mapper = FloorFieldMapper { project_id };

        let (floors, mut summary) = map_records(&mapper, &records)?;
        let ids = self.floor_repo.batch_insert(project_id, &floors)?;
        summary.imported_rows = ids.len();
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            project_id,
            file = %file_path.as_ref().display(),
            total = summary.total_rows,
            imported = summary.imported_rows,
            rejected = summary.rejected.len(),
            elapsed_ms = summary.elapsed_ms,
            "楼层导入完成"
        );
        Ok(summary)
    }

    /// 导入到货行（采购订单行）
    pub fn import_deliveries<P: AsRef<Path>>(
        &self,
        project_id: i64,
        file_path: P,
    ) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let records = UniversalFileParser.parse(file_path.as_ref())?;
        let mapper = DeliveryFieldMapper { project_id };

        let (lines, mut summary) = map_records(&mapper, &records)?;
        summary.imported_rows = self.delivery_repo.batch_insert(&lines)?;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            project_id,
            file = %file_path.as_ref().display(),
            total = summary.total_rows,
            imported = summary.imported_rows,
            rejected = summary.rejected.len(),
            elapsed_ms = summary.elapsed_ms,
            "到货数据导入完成"
        );
        Ok(summary)
    }
}

/// 映射全部行: 必需列缺失时整体失败,行级错误记入汇总
fn map_records<M: RecordMapper>(
    mapper: &M,
    records: &[RawRecord],
) -> ImportResult<(Vec<M::Output>, ImportSummary)> {
    let headers: HashSet<&String> = records.iter().flat_map(|r| r.keys()).collect();
    if !records.is_empty() {
        for column in mapper.required_columns() {
            if !has_column(headers.iter().copied(), column) {
                return Err(ImportError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
    }

    let mut summary = ImportSummary {
        total_rows: records.len(),
        ..ImportSummary::default()
    };
    let mut outputs = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        // 表头为第 1 行
        let row_number = idx + 2;
        match mapper.map_record(record, row_number) {
            Ok(output) => outputs.push(output),
            Err(err) => {
                warn!(row = row_number, error = %err, "导入行被拒绝");
                summary.rejected.push(RejectedRow {
                    row_number: err.row().unwrap_or(row_number),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok((outputs, summary))
}
