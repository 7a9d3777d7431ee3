// ==========================================
// 工程量计算引擎 - 字段映射器实现
// ==========================================
// 职责: 源字段 → 标准字段映射 + 类型转换
// 表头: 支持英文与阿拉伯文列名 (英文不区分大小写)
// ==========================================

use crate::domain::floor::Floor;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{RawRecord, RecordMapper};
use crate::repository::delivery_repo::PurchaseOrderLineEntity;
use chrono::NaiveDate;

/// 未填写状态的到货行默认视为已到货
pub const DEFAULT_DELIVERY_STATUS: &str = "delivered";

// ==========================================
// 列名别名表
// ==========================================
fn aliases(key: &str) -> &'static [&'static str] {
    match key {
        // 楼层
        "floor_number" => &["floor_number", "floor no", "رقم الطابق", "رقم الدور"],
        "floor_name" => &["floor_name", "floor", "اسم الطابق", "الطابق", "الدور"],
        "area" => &["area", "area_m2", "المساحة", "مساحة الطابق"],
        "steel_factor" => &["steel_factor", "steel_kg_m2", "معامل الحديد", "نسبة الحديد"],

        // 到货
        "po_number" => &["po_number", "po", "رقم أمر الشراء", "أمر الشراء"],
        "status" => &["status", "po_status", "الحالة", "حالة الطلب"],
        "catalog_item_id" => &["catalog_item_id", "item_id", "رقم الصنف", "كود الصنف"],
        "item_name" => &["item_name", "item", "material", "اسم الصنف", "الصنف", "المادة"],
        "delivered_quantity" => &[
            "delivered_quantity",
            "quantity",
            "qty",
            "الكمية المستلمة",
            "الكمية الموردة",
            "الكمية",
        ],
        "delivered_at" => &["delivered_at", "delivery_date", "تاريخ الاستلام", "تاريخ التوريد"],
        _ => &[],
    }
}

fn header_matches(header: &str, alias: &str) -> bool {
    let header = header.trim();
    header == alias || header.eq_ignore_ascii_case(alias)
}

/// 判断表头中是否存在指定标准列（任一别名）
pub fn has_column<'a>(headers: impl IntoIterator<Item = &'a String>, key: &str) -> bool {
    let candidates = aliases(key);
    headers
        .into_iter()
        .any(|h| candidates.iter().any(|alias| header_matches(h, alias)))
}

/// 提取字符串字段（空白视为缺失），按别名顺序查找
fn get_string(row: &RawRecord, key: &str) -> Option<String> {
    for alias in aliases(key) {
        let value = row
            .iter()
            .find(|(header, _)| header_matches(header, alias))
            .map(|(_, v)| v.trim());
        if let Some(v) = value {
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }
    None
}

fn require_string(row: &RawRecord, key: &str, row_number: usize) -> ImportResult<String> {
    get_string(row, key).ok_or_else(|| ImportError::RequiredFieldMissing {
        row: row_number,
        field: key.to_string(),
    })
}

/// 解析浮点数（允许千分位逗号）
fn parse_f64(row: &RawRecord, key: &str, row_number: usize) -> ImportResult<Option<f64>> {
    match get_string(row, key) {
        None => Ok(None),
        Some(value) => {
            let parsed = value
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为数值: {}", value),
                })?;
            if parsed < 0.0 {
                return Err(ImportError::NegativeValue {
                    row: row_number,
                    field: key.to_string(),
                    value: parsed,
                });
            }
            Ok(Some(parsed))
        }
    }
}

/// 解析整数（Excel 数值单元格可能带 ".0"）
fn parse_i64(row: &RawRecord, key: &str, row_number: usize) -> ImportResult<Option<i64>> {
    match get_string(row, key) {
        None => Ok(None),
        Some(value) => {
            let trimmed = value.strip_suffix(".0").unwrap_or(&value);
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为整数: {}", value),
                })
        }
    }
}

/// 解析日期（YYYY-MM-DD / YYYYMMDD / DD/MM/YYYY）
fn parse_date(row: &RawRecord, key: &str, row_number: usize) -> ImportResult<Option<NaiveDate>> {
    match get_string(row, key) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&value, "%Y%m%d"))
            .or_else(|_| NaiveDate::parse_from_str(&value, "%d/%m/%Y"))
            .map(Some)
            .map_err(|_| ImportError::DateFormatError {
                row: row_number,
                field: key.to_string(),
                value: value.clone(),
            }),
    }
}

// ==========================================
// FloorFieldMapper - 楼层映射
// ==========================================
pub struct FloorFieldMapper {
    pub project_id: i64,
}

impl RecordMapper for FloorFieldMapper {
    type Output = Floor;

    fn required_columns(&self) -> &'static [&'static str] {
        &["floor_number", "area"]
    }

    fn map_record(&self, row: &RawRecord, row_number: usize) -> ImportResult<Floor> {
        let floor_number = parse_i64(row, "floor_number", row_number)?.ok_or_else(|| {
            ImportError::RequiredFieldMissing {
                row: row_number,
                field: "floor_number".to_string(),
            }
        })?;
        let floor_number = i32::try_from(floor_number).map_err(|_| ImportError::TypeConversionError {
            row: row_number,
            field: "floor_number".to_string(),
            message: format!("楼层号超出范围: {}", floor_number),
        })?;

        let area = parse_f64(row, "area", row_number)?.ok_or_else(|| {
            ImportError::RequiredFieldMissing {
                row: row_number,
                field: "area".to_string(),
            }
        })?;

        Ok(Floor {
            id: 0,
            project_id: self.project_id,
            floor_number,
            floor_name: get_string(row, "floor_name").unwrap_or_else(|| floor_number.to_string()),
            area,
            steel_factor: parse_f64(row, "steel_factor", row_number)?,
        })
    }
}

// ==========================================
// DeliveryFieldMapper - 到货行映射
// ==========================================
pub struct DeliveryFieldMapper {
    pub project_id: i64,
}

impl RecordMapper for DeliveryFieldMapper {
    type Output = PurchaseOrderLineEntity;

    fn required_columns(&self) -> &'static [&'static str] {
        &["item_name", "delivered_quantity"]
    }

    fn map_record(&self, row: &RawRecord, row_number: usize) -> ImportResult<PurchaseOrderLineEntity> {
        let delivered_quantity = parse_f64(row, "delivered_quantity", row_number)?.ok_or_else(|| {
            ImportError::RequiredFieldMissing {
                row: row_number,
                field: "delivered_quantity".to_string(),
            }
        })?;

        Ok(PurchaseOrderLineEntity {
            id: None,
            project_id: self.project_id,
            po_number: get_string(row, "po_number").unwrap_or_default(),
            status: get_string(row, "status")
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string()),
            catalog_item_id: parse_i64(row, "catalog_item_id", row_number)?,
            item_name: require_string(row, "item_name", row_number)?,
            delivered_quantity,
            delivered_at: parse_date(row, "delivered_at", row_number)?,
        })
    }
}
