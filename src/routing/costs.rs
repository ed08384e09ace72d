use crate::world::cell::Cell;

const SHORE_COST: u32 = 40;
const RIVER_COST: u32 = 10;
const COASTAL_WATER_COST: u32 = 10;
const DEEP_WATER_COST: u32 = 20;
/// Land cost by elevation category of the target cell.
const LAND_COSTS: [i32; 5] = [10, 20, 30, 100, 1000];

/// Cost of moving goods from `source` into the neighboring `target`.
///
/// Water is cheap, coasts cheaper than open sea, and following a river
/// downstream is as cheap as coasting. Embarking or landing carries a flat
/// surcharge. On land the cost rises steeply with elevation category and
/// forest adds up to 5 either way.
pub fn trade_route_cost(source: &Cell, target: &Cell) -> u32 {
    if source.is_water != target.is_water {
        return SHORE_COST;
    }
    if source.flows_into(target.id) {
        return RIVER_COST;
    }
    if target.is_water {
        return if target.is_deep_water {
            DEEP_WATER_COST
        } else {
            COASTAL_WATER_COST
        };
    }

    let category = (target.elevation_category as usize).min(LAND_COSTS.len() - 1);
    let forest = (target.forest * 10.0 - 5.0).round_ties_even() as i32;
    (LAND_COSTS[category] + forest).max(1) as u32
}
