use crate::domain::area_rule::AreaMaterialRule;
use crate::domain::boq::{BoqLine, FloorQuantity};
use crate::domain::floor::{Floor, FloorRegistry};
use crate::domain::types::{BoqSource, CalculationMethod, CalculationType};
use crate::engine::error::RuleConfigurationError;

/// 面积规则用量
///
/// 计算顺序:
/// 1. direct 取 direct_quantity; factor 取 floor_area × factor
/// 2. 铺贴规则且面积 > 0 时改为 floor_area / 单块面积 (优先于以上两种)
/// 3. 最后乘以损耗系数 (1 + waste/100)
pub fn area_quantity(rule: &AreaMaterialRule, floor_area: f64) -> f64 {
    let mut base = match rule.calculation_method {
        CalculationMethod::Direct => rule.direct_quantity,
        CalculationMethod::Factor => floor_area * rule.factor,
    };

    if let Some(tile_area) = rule.tile_area_m2() {
        if floor_area > 0.0 {
            base = floor_area / tile_area;
        }
    }

    base * rule.waste_multiplier()
}

/// 规则作用的楼层集合及其面积
///
/// 指定楼层不存在时面积按 0 处理 (数据缺口,不中止)
fn resolve_scope<'a>(rule: &AreaMaterialRule, registry: &FloorRegistry<'a>) -> (Vec<&'a Floor>, f64) {
    match rule.calculation_type {
        CalculationType::SelectedFloor => {
            match rule.selected_floor_id.and_then(|id| registry.find(id)) {
                Some(floor) => (vec![floor], floor.area),
                None => (Vec::new(), 0.0),
            }
        }
        CalculationType::AllFloors => (registry.ordered(), registry.total_area()),
    }
}

/// 按面积占比拆分到各楼层
fn distribute(scope: &[&Floor], floor_area: f64, quantity: f64) -> Vec<FloorQuantity> {
    if scope.len() == 1 {
        let floor = scope[0];
        return vec![FloorQuantity {
            floor_id: floor.id,
            floor_number: floor.floor_number,
            floor_name: floor.floor_name.clone(),
            area: floor.area,
            quantity,
        }];
    }
    if floor_area <= 0.0 {
        return Vec::new();
    }

    scope
        .iter()
        .map(|floor| FloorQuantity {
            floor_id: floor.id,
            floor_number: floor.floor_number,
            floor_name: floor.floor_name.clone(),
            area: floor.area,
            quantity: quantity * floor.area / floor_area,
        })
        .collect()
}

/// 生成单条面积规则的清单行
pub(super) fn compute_area_line(
    rule: &AreaMaterialRule,
    registry: &FloorRegistry<'_>,
) -> Result<BoqLine, RuleConfigurationError> {
    if let Some(issue) = rule.configuration_issue() {
        return Err(RuleConfigurationError {
            rule_id: rule.id,
            item_name: rule.item_name.clone(),
            issue,
        });
    }

    let (scope, floor_area) = resolve_scope(rule, registry);
    let quantity = area_quantity(rule, floor_area);

    Ok(BoqLine {
        catalog_item_id: rule.catalog_item_id,
        item_code: None,
        item_name: rule.item_name.clone(),
        unit: rule.unit.clone(),
        quantity,
        unit_price: rule.unit_price,
        total_price: BoqLine::line_total(quantity, rule.unit_price),
        source: BoqSource::Area,
        rule_id: Some(rule.id),
        floor_breakdown: distribute(&scope, floor_area, quantity),
    })
}
