use crate::domain::boq::{FloorSteel, SteelReport};
use crate::domain::floor::FloorRegistry;

/// 含钢量报告: steel_kg = area × 有效含钢量, total_tons = Σkg / 1000
pub(super) fn steel_report(registry: &FloorRegistry<'_>, project_default: f64) -> SteelReport {
    let floors: Vec<FloorSteel> = registry
        .ordered()
        .into_iter()
        .map(|floor| {
            let steel_factor = floor.effective_steel_factor(project_default);
            FloorSteel {
                floor_id: floor.id,
                floor_number: floor.floor_number,
                floor_name: floor.floor_name.clone(),
                area: floor.area,
                steel_factor,
                uses_project_default: floor.uses_default_steel_factor(),
                steel_kg: floor.area * steel_factor,
            }
        })
        .collect();

    let total_kg: f64 = floors.iter().map(|f| f.steel_kg).sum();

    SteelReport {
        floors,
        total_kg,
        total_tons: total_kg / 1000.0,
    }
}
