use std::collections::HashSet;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::world::cell::{Cell, CellId, FlowDirection, RiverConnection, RiverId};

/// Origin sampling weight per elevation category. Water and border cells never seed a river.
const ORIGIN_WEIGHTS: [u32; 5] = [0, 1, 2, 8, 4];

const MERGE_BONUS: u32 = 50;
const DOWNHILL_WEIGHT: u32 = 100;
const LEVEL_WEIGHT: u32 = 50;
const UPHILL_WEIGHT: u32 = 1;
/// Bonus for continuing straight; scaled down linearly to 0 for a full reversal.
const CONTINUITY_BONUS: f64 = 20.0;

/// Fallback scheme: neighbors this much higher than the current cell are unreachable.
const UPSTREAM_TOLERANCE: f32 = 0.1;
/// Fallback scheme: one extra weight point per this much elevation drop.
const DOWNSTREAM_STEP: f32 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct River {
    pub id: RiverId,
    pub origin: CellId,
    pub path: Vec<CellId>,
}

impl River {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Last cell of the river: water, a border cell, or the cell where it joined another river.
    pub fn mouth(&self) -> CellId {
        *self.path.last().unwrap_or(&self.origin)
    }
}

/// Seed rivers until the length budget (`land_cells * river_ratio`) is spent.
///
/// Origins are drawn with replacement, weighted by elevation category; an
/// origin that already carries a river is skipped, and an origin whose walk
/// gets stuck simply produces no river.
pub fn generate_rivers(
    cells: &mut [Cell],
    land_cells: usize,
    river_ratio: f32,
    rng: &mut impl Rng,
) -> Vec<River> {
    let mut budget = (land_cells as f32 * river_ratio).round() as i64;
    if budget <= 0 {
        return Vec::new();
    }

    let weights: Vec<u32> = cells.iter().map(origin_weight).collect();
    let Ok(distribution) = WeightedIndex::new(&weights) else {
        debug!("No cell can seed a river");
        return Vec::new();
    };
    let origins: Vec<usize> = (0..budget).map(|_| distribution.sample(rng)).collect();

    let mut rivers: Vec<River> = Vec::new();
    let mut failed = 0;
    for origin in origins {
        if budget <= 0 {
            break;
        }
        if cells[origin].has_river() {
            continue;
        }
        match create_river(cells, origin as CellId, rivers.len() as RiverId, rng) {
            Some(river) => {
                budget -= river.len() as i64;
                rivers.push(river);
            }
            None => failed += 1,
        }
    }

    info!(
        rivers = rivers.len(),
        failed,
        total_length = rivers.iter().map(River::len).sum::<usize>(),
        "Generated rivers"
    );
    rivers
}

fn origin_weight(cell: &Cell) -> u32 {
    if cell.is_water || cell.border.is_border() {
        0
    } else {
        ORIGIN_WEIGHTS[cell.elevation_category as usize]
    }
}

/// Walk a river from `origin` and record its in/out connections.
///
/// The walk ends on water, on a border cell, or right after stepping onto a
/// cell that already carries a river. Returns `None` when the walk gets stuck
/// or when `origin` cannot start a river (water, border or already rivered);
/// nothing is recorded in that case.
pub fn create_river(cells: &mut [Cell], origin: CellId, id: RiverId, rng: &mut impl Rng) -> Option<River> {
    let start = &cells[origin as usize];
    if start.is_water || start.border.is_border() || start.has_river() {
        return None;
    }

    let path = trace_river(cells, origin, rng)?;

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        cells[a as usize].river_connections.push(RiverConnection {
            river: id,
            neighbor: b,
            direction: FlowDirection::Out,
        });
        cells[b as usize].river_connections.push(RiverConnection {
            river: id,
            neighbor: a,
            direction: FlowDirection::In,
        });
    }

    debug!(river = id, origin, length = path.len(), "Created river");
    Some(River { id, origin, path })
}

fn trace_river(cells: &[Cell], origin: CellId, rng: &mut impl Rng) -> Option<Vec<CellId>> {
    let mut path = vec![origin];
    let mut on_path: HashSet<CellId> = HashSet::from([origin]);
    // Neighbors of every path cell before the current one.
    let mut shadow: HashSet<CellId> = HashSet::new();
    let mut last_bearing: Option<f64> = None;
    let mut current = origin;

    loop {
        let cell = &cells[current as usize];
        if cell.is_water || cell.border.is_border() {
            break;
        }

        let mut weights: Vec<u32> = cell
            .neighbors
            .iter()
            .zip(&cell.neighbor_bearings)
            .map(|(&n, &bearing)| {
                if on_path.contains(&n) || shadow.contains(&n) {
                    0
                } else {
                    flow_weight(cell, &cells[n as usize], bearing, last_bearing)
                }
            })
            .collect();

        if weights.iter().all(|&w| w == 0) {
            weights = cell
                .neighbors
                .iter()
                .map(|&n| {
                    if on_path.contains(&n) {
                        0
                    } else {
                        fallback_weight(cell, &cells[n as usize])
                    }
                })
                .collect();
        }

        let choice = WeightedIndex::new(&weights).ok()?.sample(rng);
        let next = cell.neighbors[choice];
        last_bearing = Some(cell.neighbor_bearings[choice]);

        shadow.extend(cell.neighbors.iter().copied());
        path.push(next);
        on_path.insert(next);

        if cells[next as usize].has_river() {
            break;
        }
        current = next;
    }

    Some(path)
}

fn flow_weight(cell: &Cell, neighbor: &Cell, bearing: f64, last_bearing: Option<f64>) -> u32 {
    let mut weight = 0;
    if neighbor.has_river() {
        weight += MERGE_BONUS;
    }
    weight += match cell.elevation_category.cmp(&neighbor.elevation_category) {
        std::cmp::Ordering::Greater => DOWNHILL_WEIGHT,
        std::cmp::Ordering::Equal => LEVEL_WEIGHT,
        std::cmp::Ordering::Less => UPHILL_WEIGHT,
    };
    if let Some(last) = last_bearing {
        let turn = turn_angle(last, bearing);
        weight += (CONTINUITY_BONUS * (180.0 - turn) / 180.0).round() as u32;
    }
    weight
}

fn fallback_weight(cell: &Cell, neighbor: &Cell) -> u32 {
    if neighbor.elevation - UPSTREAM_TOLERANCE > cell.elevation {
        0
    } else if neighbor.elevation < cell.elevation {
        1 + ((cell.elevation - neighbor.elevation) / DOWNSTREAM_STEP).round() as u32
    } else {
        1
    }
}

/// Absolute difference between two bearings, folded into [0, 180].
fn turn_angle(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cell::{CellSamples, Point};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 4-connected grid sloping down towards x = 0, where column 0 is sea.
    /// Category rises by one every two columns, capped at 4.
    fn slope(width: u32, height: u32) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let id = y * width + x;
                let samples = CellSamples {
                    elevation: x as f32 / width as f32,
                    ..CellSamples::default()
                };
                let mut cell = Cell::new(id, id as usize, Point::new(x as f64, y as f64), samples);
                cell.is_water = x == 0;
                cell.elevation_category = ((x + 1) / 2).min(4) as u8;
                cell.border.west = x == 0;
                cell.border.east = x == width - 1;
                cell.border.north = y == 0;
                cell.border.south = y == height - 1;
                if x > 0 {
                    cell.neighbors.push(id - 1);
                }
                if x + 1 < width {
                    cell.neighbors.push(id + 1);
                }
                if y > 0 {
                    cell.neighbors.push(id - width);
                }
                if y + 1 < height {
                    cell.neighbors.push(id + width);
                }
                cells.push(cell);
            }
        }
        let positions: Vec<Point> = cells.iter().map(|c| c.position).collect();
        for cell in &mut cells {
            cell.cache_bearings(&positions);
        }
        cells
    }

    fn assert_valid_river(cells: &[Cell], river: &River) {
        let unique: HashSet<CellId> = river.path.iter().copied().collect();
        assert_eq!(unique.len(), river.len(), "River {} revisits a cell", river.id);
        for pair in river.path.windows(2) {
            assert!(
                cells[pair[0] as usize].neighbors.contains(&pair[1]),
                "River {} jumps from {} to {}",
                river.id,
                pair[0],
                pair[1]
            );
        }
        assert_eq!(river.path[0], river.origin);
    }

    #[test]
    fn turn_angle_folds() {
        assert_eq!(turn_angle(10.0, 10.0), 0.0);
        assert_eq!(turn_angle(-90.0, 90.0), 180.0);
        assert_eq!(turn_angle(170.0, -170.0), 20.0);
        assert_eq!(turn_angle(0.0, 270.0), 90.0);
    }

    #[test]
    fn flow_prefers_downhill_and_straight() {
        let cells = slope(6, 6);
        let cell = &cells[3 * 6 + 3];
        let west = &cells[3 * 6 + 2];
        let east = &cells[3 * 6 + 4];
        assert!(flow_weight(cell, west, 180.0, None) > flow_weight(cell, east, 0.0, None));
        let straight = flow_weight(cell, west, 180.0, Some(180.0));
        let reversed = flow_weight(cell, west, 180.0, Some(0.0));
        assert_eq!(straight - reversed, CONTINUITY_BONUS as u32);
    }

    #[test]
    fn fallback_blocks_steep_climbs() {
        let mut cells = slope(4, 3);
        cells[5].elevation = 0.2;
        cells[6].elevation = 0.5;
        cells[4].elevation = 0.1;
        assert_eq!(fallback_weight(&cells[5], &cells[6]), 0);
        assert_eq!(fallback_weight(&cells[5], &cells[4]), 21);
        cells[6].elevation = 0.25;
        assert_eq!(fallback_weight(&cells[5], &cells[6]), 1);
    }

    /// First seed in 0..16 for which `origin` yields a river.
    fn river_from(cells: &mut [Cell], origin: CellId, id: RiverId) -> River {
        (0..16)
            .find_map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                create_river(cells, origin, id, &mut rng)
            })
            .expect("some seed produces a river on a slope")
    }

    #[test]
    fn river_reaches_sea_on_slope() {
        let mut cells = slope(12, 9);
        let river = river_from(&mut cells, 4 * 12 + 9, 0);
        assert_valid_river(&cells, &river);
        let mouth = &cells[river.mouth() as usize];
        assert!(mouth.is_water || mouth.border.is_border());
    }

    #[test]
    fn connections_are_recorded_in_both_directions() {
        let mut cells = slope(10, 7);
        let river = river_from(&mut cells, 3 * 10 + 6, 7);
        for pair in river.path.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            assert!(cells[a].flows_into(pair[1]));
            assert!(cells[b].river_connections.iter().any(|c| {
                c.river == 7 && c.neighbor == pair[0] && c.direction == FlowDirection::In
            }));
        }
    }

    #[test]
    fn water_or_border_origin_makes_no_river() {
        let mut cells = slope(6, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(create_river(&mut cells, 2 * 6, 0, &mut rng).is_none());
        assert!(create_river(&mut cells, 5, 0, &mut rng).is_none());
        assert!(cells.iter().all(|c| !c.has_river()));
    }

    #[test]
    fn stuck_origin_fails_without_side_effects() {
        let mut cells = slope(3, 3);
        cells[4].neighbors.clear();
        cells[4].neighbor_bearings.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(create_river(&mut cells, 4, 0, &mut rng).is_none());
        assert!(cells.iter().all(|c| !c.has_river()));
    }

    #[test]
    fn second_river_merges_or_reaches_sea() {
        let mut cells = slope(14, 10);
        let first = river_from(&mut cells, 5 * 14 + 10, 0);
        let second = river_from(&mut cells, 5 * 14 + 12, 1);
        assert_valid_river(&cells, &first);
        assert_valid_river(&cells, &second);
        let mouth = &cells[second.mouth() as usize];
        let joined = first.path.contains(&second.mouth());
        assert!(joined || mouth.is_water || mouth.border.is_border());
    }

    #[test]
    fn generated_rivers_respect_budget_and_shape() {
        let mut cells = slope(16, 12);
        let land = cells.iter().filter(|c| !c.is_water).count();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let rivers = generate_rivers(&mut cells, land, 0.2, &mut rng);
        assert!(!rivers.is_empty());
        for (i, river) in rivers.iter().enumerate() {
            assert_eq!(river.id as usize, i);
            assert_valid_river(&cells, river);
            let origin = &cells[river.origin as usize];
            assert!(!origin.is_water && !origin.border.is_border());
        }
        // The budget may be overshot by at most the last river.
        let budget = (land as f32 * 0.2).round() as usize;
        let total: usize = rivers.iter().map(River::len).sum();
        let last = rivers.last().map(River::len).unwrap_or(0);
        assert!(total < budget + last, "total {} budget {}", total, budget);
    }

    #[test]
    fn zero_ratio_makes_no_rivers() {
        let mut cells = slope(8, 8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate_rivers(&mut cells, 40, 0.0, &mut rng).is_empty());
    }
}
