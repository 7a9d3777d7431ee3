// ==========================================
// 工程量计算引擎 - 户型模板领域模型
// ==========================================
// 职责: 可重复户型设计 + 每户材料清单
// 不变量: 材料总贡献 = quantity_per_unit × unit_count
// ==========================================

use crate::domain::validation::{check_non_negative, EntityKind, InputViolation};
use serde::{Deserialize, Serialize};

// ==========================================
// TemplateMaterial - 户型材料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMaterial {
    pub catalog_item_id: Option<i64>,
    pub item_code: Option<String>,
    pub item_name: String,
    pub unit: String,
    pub quantity_per_unit: f64, // 每户用量
    pub unit_price: f64,
}

impl TemplateMaterial {
    /// 该材料在给定户数下的总用量
    pub fn total_quantity(&self, unit_count: i64) -> f64 {
        self.quantity_per_unit * unit_count as f64
    }
}

// ==========================================
// UnitTemplate - 户型模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: i64,
    pub project_id: i64,
    pub code: String,
    pub name: String,
    pub area: f64,
    pub rooms_count: i32,
    pub bathrooms_count: i32,
    pub unit_count: i64, // 户数
    #[serde(default)]
    pub materials: Vec<TemplateMaterial>,
}

impl UnitTemplate {
    /// 户型总面积 (单户面积 × 户数)
    pub fn total_area(&self) -> f64 {
        self.area * self.unit_count as f64
    }

    pub fn validate(&self, violations: &mut Vec<InputViolation>) {
        check_non_negative(EntityKind::UnitTemplate, self.id, "area", self.area, violations);
        check_non_negative(
            EntityKind::UnitTemplate,
            self.id,
            "unit_count",
            self.unit_count as f64,
            violations,
        );
        for material in &self.materials {
            check_non_negative(
                EntityKind::TemplateMaterial,
                self.id,
                "quantity_per_unit",
                material.quantity_per_unit,
                violations,
            );
        }
    }
}

// ==========================================
// UnitTemplateCatalog - 户型目录 (只读视图)
// ==========================================
pub struct UnitTemplateCatalog<'a> {
    templates: &'a [UnitTemplate],
}

impl<'a> UnitTemplateCatalog<'a> {
    pub fn new(templates: &'a [UnitTemplate]) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &'a [UnitTemplate] {
        self.templates
    }

    /// 项目总户数
    pub fn total_units(&self) -> i64 {
        self.templates.iter().map(|t| t.unit_count).sum()
    }

    /// 按 (模板, 材料) 对展开
    pub fn material_pairs(&self) -> impl Iterator<Item = (&'a UnitTemplate, &'a TemplateMaterial)> {
        self.templates
            .iter()
            .flat_map(|t| t.materials.iter().map(move |m| (t, m)))
    }

    pub fn validate(&self) -> Vec<InputViolation> {
        let mut violations = Vec::new();
        for template in self.templates {
            template.validate(&mut violations);
        }
        violations
    }
}
