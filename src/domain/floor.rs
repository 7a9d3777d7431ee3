// ==========================================
// 工程量计算引擎 - 楼层领域模型
// ==========================================
// 职责: 楼层面积与含钢量登记
// 约定: 负楼层号为地下结构, 99 保留给屋面
// ==========================================

use crate::domain::types::FloorKind;
use crate::domain::validation::{check_non_negative, EntityKind, InputViolation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 屋面保留楼层号
pub const ROOF_FLOOR_NUMBER: i32 = 99;

// ==========================================
// Floor - 楼层
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub id: i64,
    pub project_id: i64,
    pub floor_number: i32,
    pub floor_name: String,
    pub area: f64,                 // 楼层面积 (m²)
    pub steel_factor: Option<f64>, // 含钢量 (kg/m²), 为空时取项目默认值
}

impl Floor {
    /// 楼层类别
    pub fn kind(&self) -> FloorKind {
        match self.floor_number {
            n if n < 0 => FloorKind::Substructure,
            0 => FloorKind::Ground,
            ROOF_FLOOR_NUMBER => FloorKind::Roof,
            _ => FloorKind::Typical,
        }
    }

    /// 有效含钢量
    ///
    /// 楼层未设置 (或设置为非正数) 时使用项目默认含钢量
    pub fn effective_steel_factor(&self, project_default: f64) -> f64 {
        match self.steel_factor {
            Some(f) if f > 0.0 => f,
            _ => project_default,
        }
    }

    /// 是否使用了项目默认含钢量
    pub fn uses_default_steel_factor(&self) -> bool {
        !matches!(self.steel_factor, Some(f) if f > 0.0)
    }

    pub fn validate(&self, violations: &mut Vec<InputViolation>) {
        check_non_negative(EntityKind::Floor, self.id, "area", self.area, violations);
        if let Some(f) = self.steel_factor {
            check_non_negative(EntityKind::Floor, self.id, "steel_factor", f, violations);
        }
    }
}

// ==========================================
// FloorRegistry - 楼层登记表 (只读视图)
// ==========================================
pub struct FloorRegistry<'a> {
    floors: &'a [Floor],
    by_id: HashMap<i64, usize>,
}

impl<'a> FloorRegistry<'a> {
    pub fn new(floors: &'a [Floor]) -> Self {
        let mut by_id = HashMap::with_capacity(floors.len());
        for (idx, floor) in floors.iter().enumerate() {
            by_id.entry(floor.id).or_insert(idx);
        }
        Self { floors, by_id }
    }

    pub fn floors(&self) -> &'a [Floor] {
        self.floors
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn find(&self, floor_id: i64) -> Option<&'a Floor> {
        self.by_id.get(&floor_id).map(|&idx| &self.floors[idx])
    }

    /// 全部楼层面积之和
    pub fn total_area(&self) -> f64 {
        self.floors.iter().map(|f| f.area).sum()
    }

    /// 按楼层号排序 (楼层号相同按 id)
    pub fn ordered(&self) -> Vec<&'a Floor> {
        let mut ordered: Vec<&Floor> = self.floors.iter().collect();
        ordered.sort_by_key(|f| (f.floor_number, f.id));
        ordered
    }

    /// 校验所有楼层
    pub fn validate(&self) -> Vec<InputViolation> {
        let mut violations = Vec::new();
        for floor in self.floors {
            floor.validate(&mut violations);
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(id: i64, number: i32, area: f64, steel_factor: Option<f64>) -> Floor {
        Floor {
            id,
            project_id: 1,
            floor_number: number,
            floor_name: format!("F{}", number),
            area,
            steel_factor,
        }
    }

    #[test]
    fn test_floor_kind() {
        assert_eq!(floor(1, -2, 100.0, None).kind(), FloorKind::Substructure);
        assert_eq!(floor(2, 0, 100.0, None).kind(), FloorKind::Ground);
        assert_eq!(floor(3, 7, 100.0, None).kind(), FloorKind::Typical);
        assert_eq!(floor(4, ROOF_FLOOR_NUMBER, 100.0, None).kind(), FloorKind::Roof);
    }

    #[test]
    fn test_effective_steel_factor_falls_back_to_project_default() {
        assert_eq!(floor(1, 1, 100.0, Some(120.0)).effective_steel_factor(90.0), 120.0);
        assert_eq!(floor(1, 1, 100.0, None).effective_steel_factor(90.0), 90.0);
        assert_eq!(floor(1, 1, 100.0, Some(0.0)).effective_steel_factor(90.0), 90.0);
        assert!(floor(1, 1, 100.0, Some(0.0)).uses_default_steel_factor());
    }

    #[test]
    fn test_registry_totals_and_order() {
        let floors = vec![
            floor(10, 3, 200.0, None),
            floor(11, -1, 150.0, None),
            floor(12, 0, 100.0, None),
        ];
        let registry = FloorRegistry::new(&floors);

        assert_eq!(registry.total_area(), 450.0);
        assert_eq!(registry.find(11).map(|f| f.floor_number), Some(-1));
        assert!(registry.find(99).is_none());

        let numbers: Vec<i32> = registry.ordered().iter().map(|f| f.floor_number).collect();
        assert_eq!(numbers, vec![-1, 0, 3]);
    }

    #[test]
    fn test_registry_rejects_negative_area() {
        let floors = vec![floor(1, 1, -5.0, None), floor(2, 2, f64::NAN, None)];
        let violations = FloorRegistry::new(&floors).validate();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].entity, EntityKind::Floor);
        assert_eq!(violations[0].field, "area");
    }
}
