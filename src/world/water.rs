use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::world::cell::{Cell, CellId, WaterBodyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaterBodyKind {
    /// Connected water touching the map border.
    Ocean,
    /// Connected water fully enclosed by land.
    Lake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBody {
    pub id: WaterBodyId,
    pub kind: WaterBodyKind,
    pub cells: Vec<CellId>,
}

/// Collect every cell reachable from `start` through cells matching `predicate`.
///
/// Uses an explicit worklist, so depth is bounded by memory rather than the
/// call stack. `start` is included only if it matches. Membership order is
/// discovery order.
pub fn flood_fill(cells: &[Cell], start: CellId, predicate: impl Fn(&Cell) -> bool) -> Vec<CellId> {
    let mut visited = vec![false; cells.len()];
    flood_fill_marked(cells, start, &predicate, &mut visited)
}

fn flood_fill_marked(
    cells: &[Cell],
    start: CellId,
    predicate: &impl Fn(&Cell) -> bool,
    visited: &mut [bool],
) -> Vec<CellId> {
    let mut members = Vec::new();
    if visited[start as usize] || !predicate(&cells[start as usize]) {
        return members;
    }

    let mut stack = vec![start];
    visited[start as usize] = true;
    while let Some(id) = stack.pop() {
        members.push(id);
        for &neighbor in &cells[id as usize].neighbors {
            let n = neighbor as usize;
            if !visited[n] && predicate(&cells[n]) {
                visited[n] = true;
                stack.push(neighbor);
            }
        }
    }
    members
}

/// Group water cells into connected bodies and mark coasts.
///
/// A body is an [`WaterBodyKind::Ocean`] if any member is a border cell,
/// otherwise a [`WaterBodyKind::Lake`]. Land cells next to water become
/// coastal; water cells next to land lose their deep-water flag. Resets every
/// flag it owns, so running it twice gives the same result.
pub fn label_water_bodies(cells: &mut [Cell]) -> Vec<WaterBody> {
    for cell in cells.iter_mut() {
        cell.water_body = None;
        cell.is_coastal = false;
        cell.is_deep_water = cell.is_water;
    }

    let mut bodies = Vec::new();
    let mut visited = vec![false; cells.len()];
    for start in 0..cells.len() {
        if visited[start] || !cells[start].is_water {
            continue;
        }
        let members = flood_fill_marked(cells, start as CellId, &|c: &Cell| c.is_water, &mut visited);
        let kind = if members.iter().any(|&m| cells[m as usize].border.is_border()) {
            WaterBodyKind::Ocean
        } else {
            WaterBodyKind::Lake
        };
        let id = bodies.len() as WaterBodyId;
        for &m in &members {
            cells[m as usize].water_body = Some(id);
        }
        debug!(body = id, kind = ?kind, size = members.len(), "Labeled water body");
        bodies.push(WaterBody {
            id,
            kind,
            cells: members,
        });
    }

    mark_coasts(cells);

    bodies
}

fn mark_coasts(cells: &mut [Cell]) {
    let mut shore_pairs: Vec<(usize, usize)> = Vec::new();
    for cell in cells.iter().filter(|c| c.is_water) {
        for &n in &cell.neighbors {
            if !cells[n as usize].is_water {
                shore_pairs.push((cell.id as usize, n as usize));
            }
        }
    }
    for (water, land) in shore_pairs {
        cells[water].is_deep_water = false;
        cells[land].is_coastal = true;
    }
}
