use serde::{Deserialize, Serialize};

use crate::routing::costs::trade_route_cost;
use crate::routing::search::{PathFinder, SearchGraph};
use crate::world::cell::{Cell, CellId};

/// Which cells a terrain search may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraversalFilter {
    #[default]
    Any,
    LandOnly,
    WaterOnly,
}

impl TraversalFilter {
    pub fn allows(&self, cell: &Cell) -> bool {
        match self {
            TraversalFilter::Any => true,
            TraversalFilter::LandOnly => !cell.is_water,
            TraversalFilter::WaterOnly => cell.is_water,
        }
    }
}

/// The cell graph seen through a cost function and a traversal filter.
///
/// The heuristic is the straight-line distance to the target times
/// `heuristic_scale`, rounded.
pub struct TerrainGraph<'a, F> {
    cells: &'a [Cell],
    cost_fn: F,
    filter: TraversalFilter,
    heuristic_scale: f64,
}

impl<'a, F> TerrainGraph<'a, F>
where
    F: Fn(&Cell, &Cell) -> u32,
{
    pub fn new(cells: &'a [Cell], cost_fn: F, filter: TraversalFilter, heuristic_scale: f64) -> Self {
        TerrainGraph {
            cells,
            cost_fn,
            filter,
            heuristic_scale,
        }
    }
}

impl<F> SearchGraph for TerrainGraph<'_, F>
where
    F: Fn(&Cell, &Cell) -> u32,
{
    fn node_count(&self) -> usize {
        self.cells.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells[node]
            .neighbors
            .iter()
            .map(|&n| n as usize)
            .filter(move |&n| self.filter.allows(&self.cells[n]))
    }

    fn cost(&self, from: usize, to: usize) -> u32 {
        (self.cost_fn)(&self.cells[from], &self.cells[to])
    }

    fn heuristic(&self, node: usize, target: usize) -> u32 {
        let d = self.cells[node].position.distance_to(&self.cells[target].position);
        (d * self.heuristic_scale).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPath {
    pub cells: Vec<CellId>,
    pub cost: u32,
}

/// Trade-cost path between two cells.
pub fn cell_to_cell_path(
    finder: &mut PathFinder,
    cells: &[Cell],
    from: CellId,
    to: CellId,
    filter: TraversalFilter,
    heuristic_scale: f64,
) -> Option<CellPath> {
    let graph = TerrainGraph::new(cells, trade_route_cost, filter, heuristic_scale);
    finder
        .shortest_path(&graph, from as usize, to as usize)
        .map(|path| CellPath {
            cells: path.nodes.into_iter().map(|n| n as CellId).collect(),
            cost: path.cost,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cell::{CellSamples, Point};

    /// 3x3 4-connected grid of flat land; `water` lists water cell ids.
    fn grid(water: &[CellId]) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..3u32 {
            for x in 0..3u32 {
                let id = y * 3 + x;
                let samples = CellSamples {
                    forest: 0.5,
                    ..CellSamples::default()
                };
                let mut cell = Cell::new(id, id as usize, Point::new(x as f64, y as f64), samples);
                cell.elevation_category = 1;
                cell.is_water = water.contains(&id);
                if x > 0 {
                    cell.neighbors.push(id - 1);
                }
                if x < 2 {
                    cell.neighbors.push(id + 1);
                }
                if y > 0 {
                    cell.neighbors.push(id - 3);
                }
                if y < 2 {
                    cell.neighbors.push(id + 3);
                }
                cells.push(cell);
            }
        }
        cells
    }

    #[test]
    fn land_grid_corner_to_corner() {
        let cells = grid(&[]);
        let mut finder = PathFinder::new();
        let path = cell_to_cell_path(&mut finder, &cells, 0, 8, TraversalFilter::Any, 10.0).unwrap();
        assert_eq!(path.cells.len(), 5);
        assert_eq!(path.cost, 4 * 20);
        assert_eq!(path.cells.first(), Some(&0));
        assert_eq!(path.cells.last(), Some(&8));
        for pair in path.cells.windows(2) {
            assert!(cells[pair[0] as usize].neighbors.contains(&pair[1]));
        }
    }

    #[test]
    fn land_only_routes_around_water() {
        // Water in the middle column except the bottom row.
        let cells = grid(&[1, 4]);
        let mut finder = PathFinder::new();
        let path = cell_to_cell_path(&mut finder, &cells, 0, 2, TraversalFilter::LandOnly, 10.0).unwrap();
        assert_eq!(path.cells, vec![0, 3, 6, 7, 8, 5, 2]);
        assert!(path.cells.iter().all(|&c| !cells[c as usize].is_water));
    }

    #[test]
    fn land_only_fails_when_cut_off() {
        let cells = grid(&[1, 4, 7]);
        let mut finder = PathFinder::new();
        assert!(cell_to_cell_path(&mut finder, &cells, 0, 2, TraversalFilter::LandOnly, 10.0).is_none());
        assert!(cell_to_cell_path(&mut finder, &cells, 0, 2, TraversalFilter::Any, 10.0).is_some());
    }

    #[test]
    fn water_only_stays_at_sea() {
        let cells = grid(&[0, 1, 2, 5, 8]);
        let mut finder = PathFinder::new();
        let path = cell_to_cell_path(&mut finder, &cells, 0, 8, TraversalFilter::WaterOnly, 10.0).unwrap();
        assert_eq!(path.cells, vec![0, 1, 2, 5, 8]);
        assert!(cell_to_cell_path(&mut finder, &cells, 0, 6, TraversalFilter::WaterOnly, 10.0).is_none());
    }

    #[test]
    fn custom_cost_function_is_used() {
        let cells = grid(&[]);
        let graph = TerrainGraph::new(&cells, |_: &Cell, _: &Cell| 3, TraversalFilter::Any, 0.0);
        let path = PathFinder::new().shortest_path(&graph, 0, 8).unwrap();
        assert_eq!(path.cost, 12);
        assert_eq!(graph.heuristic(0, 8), 0);
    }

    #[test]
    fn heuristic_scales_straight_line_distance() {
        let cells = grid(&[]);
        let graph = TerrainGraph::new(&cells, trade_route_cost, TraversalFilter::Any, 10.0);
        assert_eq!(graph.heuristic(0, 2), 20);
        assert_eq!(graph.heuristic(0, 8), 28);
    }
}
