use crate::domain::area_rule::AreaMaterialRule;
use crate::domain::boq::{BoqLine, BoqSummary, SteelReport};
use crate::domain::floor::{Floor, FloorRegistry};
use crate::domain::supply::normalize_item_name;
use crate::domain::template::{TemplateMaterial, UnitTemplate, UnitTemplateCatalog};
use crate::domain::types::BoqSource;
use crate::engine::error::{EngineResult, RuleConfigurationError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{area, steel};

// ==========================================
// BoqResult - 工程量清单计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqResult {
    /// 户型材料 (跨模板合并)
    pub unit_lines: Vec<BoqLine>,
    /// 面积材料 (每条规则一行,不合并)
    pub area_lines: Vec<BoqLine>,
    pub steel_report: SteelReport,
    pub summary: BoqSummary,
    /// 规则级错误 (对应规则未产生清单行)
    pub errors: Vec<RuleConfigurationError>,
}

impl BoqResult {
    /// 全部清单行 (户型材料在前)
    pub fn lines(&self) -> impl Iterator<Item = &BoqLine> {
        self.unit_lines.iter().chain(self.area_lines.iter())
    }

    pub fn total_cost(&self) -> f64 {
        self.summary.total_cost
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ==========================================
// QuantityTakeoffAggregator - 工程量汇总器
// ==========================================
// 无状态引擎,项目默认含钢量通过构造参数传入
#[derive(Debug, Clone)]
pub struct QuantityTakeoffAggregator {
    default_steel_factor: f64,
}

impl QuantityTakeoffAggregator {
    /// 创建汇总器
    ///
    /// # 参数
    /// - `default_steel_factor`: 项目默认含钢量 (kg/m²),楼层未设置时使用
    pub fn new(default_steel_factor: f64) -> Self {
        Self {
            default_steel_factor,
        }
    }

    pub fn default_steel_factor(&self) -> f64 {
        self.default_steel_factor
    }

    /// 计算工程量清单
    ///
    /// # 返回
    /// - `Ok(BoqResult)`: 清单 (可能附带规则级错误)
    /// - `Err(EngineError::Validation)`: 存在负面积/负户数,整次计算中止
    pub fn compute_boq(
        &self,
        floors: &[Floor],
        templates: &[UnitTemplate],
        area_rules: &[AreaMaterialRule],
    ) -> EngineResult<BoqResult> {
        let registry = FloorRegistry::new(floors);
        let catalog = UnitTemplateCatalog::new(templates);

        // 1. 输入级校验
        let mut violations = registry.validate();
        violations.extend(catalog.validate());
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        // 2. 户型材料合并
        let unit_lines = merge_unit_materials(&catalog);

        // 3. 面积材料 (逐条规则,错误隔离)
        let mut area_lines = Vec::with_capacity(area_rules.len());
        let mut errors = Vec::new();
        for rule in area_rules {
            match area::compute_area_line(rule, &registry) {
                Ok(line) => area_lines.push(line),
                Err(err) => errors.push(err),
            }
        }

        // 4. 含钢量
        let steel_report = steel::steel_report(&registry, self.default_steel_factor);

        // 5. 汇总
        let summary = summarize(&registry, &catalog, &unit_lines, &area_lines);

        Ok(BoqResult {
            unit_lines,
            area_lines,
            steel_report,
            summary,
            errors,
        })
    }
}

/// 户型材料合并键
///
/// 一条材料可同时带 item_code 与 catalog_item_id,两者都登记为同一行的键;
/// 两者都缺失时才退回规范化名称
fn unit_merge_keys(material: &TemplateMaterial) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(code) = material.item_code.as_deref().map(str::trim) {
        if !code.is_empty() {
            keys.push(format!("code:{}", code));
        }
    }
    if let Some(id) = material.catalog_item_id {
        keys.push(format!("catalog:{}", id));
    }
    if keys.is_empty() {
        keys.push(format!("name:{}", normalize_item_name(&material.item_name)));
    }
    keys
}

/// 跨模板合并户型材料
///
/// 匹配顺序: item_code > catalog_item_id > 规范化名称
/// 单价取最后出现的材料价格 (保持 O(n),不做价格一致性校验)
fn merge_unit_materials(catalog: &UnitTemplateCatalog<'_>) -> Vec<BoqLine> {
    let mut lines: Vec<BoqLine> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (template, material) in catalog.material_pairs() {
        let quantity = material.total_quantity(template.unit_count);
        let keys = unit_merge_keys(material);

        let existing = keys.iter().find_map(|key| index.get(key).copied());
        let idx = match existing {
            Some(idx) => {
                let line = &mut lines[idx];
                line.quantity += quantity;
                line.unit_price = material.unit_price;
                if line.catalog_item_id.is_none() {
                    line.catalog_item_id = material.catalog_item_id;
                }
                if line.item_code.is_none() {
                    line.item_code = material.item_code.clone();
                }
                idx
            }
            None => {
                lines.push(BoqLine {
                    catalog_item_id: material.catalog_item_id,
                    item_code: material.item_code.clone(),
                    item_name: material.item_name.clone(),
                    unit: material.unit.clone(),
                    quantity,
                    unit_price: material.unit_price,
                    total_price: 0.0,
                    source: BoqSource::Unit,
                    rule_id: None,
                    floor_breakdown: Vec::new(),
                });
                lines.len() - 1
            }
        };

        // 首次登记的键保持指向原行
        for key in keys {
            index.entry(key).or_insert(idx);
        }
    }

    for line in &mut lines {
        line.total_price = BoqLine::line_total(line.quantity, line.unit_price);
    }
    lines
}

fn summarize(
    registry: &FloorRegistry<'_>,
    catalog: &UnitTemplateCatalog<'_>,
    unit_lines: &[BoqLine],
    area_lines: &[BoqLine],
) -> BoqSummary {
    let total_floor_area = registry.total_area();
    let unit_materials_cost: f64 = unit_lines.iter().map(|l| l.total_price).sum();
    let area_materials_cost: f64 = area_lines.iter().map(|l| l.total_price).sum();
    let total_cost = unit_materials_cost + area_materials_cost;

    BoqSummary {
        total_floor_area,
        total_units: catalog.total_units(),
        unit_materials_cost,
        area_materials_cost,
        total_cost,
        cost_per_m2: if total_floor_area > 0.0 {
            total_cost / total_floor_area
        } else {
            0.0
        },
    }
}
