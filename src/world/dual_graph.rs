use tracing::info;

use crate::world::cell::{Cell, CellId, CellSamples, Point};
use crate::world::topology::{Triangulation, triangle_of_edge};

/// Counts of what the builder discarded on the way to the final graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub points: usize,
    /// Points whose boundary ring had fewer than 3 vertices (or no ring at all).
    pub degenerate_rings: usize,
    /// Cells that ended up with no neighbor and were removed.
    pub isolated_cells: usize,
}

/// Convert a triangulated point set into polygonal cells with symmetric adjacency.
///
/// Every point becomes one cell whose boundary is the ring of centroids of the
/// triangles around it. Degenerate rings are dropped, and cells left without a
/// neighbor are removed; ids of the surviving cells are dense and equal to
/// their index in the returned vector.
///
/// # Panics
/// Panics if `samples` is shorter than `points`.
pub fn build_cells(
    points: &[Point],
    triangulation: &Triangulation,
    samples: &[CellSamples],
) -> (Vec<Cell>, BuildStats) {
    assert!(
        samples.len() >= points.len(),
        "Need one sample per point ({} samples for {} points)",
        samples.len(),
        points.len()
    );

    let mut stats = BuildStats {
        points: points.len(),
        ..BuildStats::default()
    };

    let mut cells = extract_rings(points, triangulation, samples);
    stats.degenerate_rings = points.len() - cells.len();

    let neighbors = derive_adjacency(&cells, triangulation.triangle_count());
    for (cell, list) in cells.iter_mut().zip(neighbors) {
        cell.neighbors = list;
    }

    let before = cells.len();
    let mut cells = remove_isolated(cells);
    stats.isolated_cells = before - cells.len();

    let positions: Vec<Point> = cells.iter().map(|c| c.position).collect();
    for cell in &mut cells {
        cell.cache_bearings(&positions);
    }

    info!(
        cells = cells.len(),
        points = stats.points,
        degenerate = stats.degenerate_rings,
        isolated = stats.isolated_cells,
        "Built cell graph"
    );

    (cells, stats)
}

/// Walk the half-edge ring of every point once and keep rings with at least 3 vertices.
fn extract_rings(points: &[Point], triangulation: &Triangulation, samples: &[CellSamples]) -> Vec<Cell> {
    let mut seen = vec![false; points.len()];
    let mut cells = Vec::with_capacity(points.len());

    for e in 0..triangulation.halfedge_count() {
        let point = triangulation.end_point(e);
        if seen[point] {
            continue;
        }
        seen[point] = true;

        let ring = triangulation.edges_around_point(e);
        if ring.len() < 3 {
            continue;
        }

        let mut cell = Cell::new(cells.len() as CellId, point, points[point], samples[point]);
        cell.corners = ring.iter().map(|&edge| triangle_of_edge(edge)).collect();
        cell.vertices = cell
            .corners
            .iter()
            .map(|&t| triangulation.centers[t])
            .collect();
        cells.push(cell);
    }

    cells
}

/// Two cells are neighbors iff their rings share at least two corners, i.e. an
/// edge rather than a single vertex.
fn derive_adjacency(cells: &[Cell], triangle_count: usize) -> Vec<Vec<CellId>> {
    let mut corner_to_cells: Vec<Vec<CellId>> = vec![Vec::new(); triangle_count];
    for cell in cells {
        for &corner in &cell.corners {
            corner_to_cells[corner].push(cell.id);
        }
    }

    let mut neighbors: Vec<Vec<CellId>> = vec![Vec::new(); cells.len()];
    for members in &corner_to_cells {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                if neighbors[a as usize].contains(&b) {
                    continue;
                }
                if shared_corners(&cells[a as usize], &cells[b as usize]) > 1 {
                    neighbors[a as usize].push(b);
                    neighbors[b as usize].push(a);
                }
            }
        }
    }
    neighbors
}

fn shared_corners(a: &Cell, b: &Cell) -> usize {
    a.corners.iter().filter(|c| b.corners.contains(c)).count()
}

/// Drop cells with no neighbors and compact the ids of the rest.
fn remove_isolated(cells: Vec<Cell>) -> Vec<Cell> {
    let mut remap: Vec<Option<CellId>> = vec![None; cells.len()];
    let mut next: CellId = 0;
    for cell in &cells {
        if !cell.neighbors.is_empty() {
            remap[cell.id as usize] = Some(next);
            next += 1;
        }
    }

    cells
        .into_iter()
        .filter(|c| !c.neighbors.is_empty())
        .map(|mut cell| {
            cell.id = remap[cell.id as usize].expect("kept cell has a new id");
            cell.neighbors = cell
                .neighbors
                .iter()
                .map(|&n| remap[n as usize].expect("neighbor of a kept cell is kept"))
                .collect();
            cell
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::topology::jittered_grid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn grid_graph(width: u32, height: u32, seed: u64) -> (Vec<Point>, Vec<Cell>, BuildStats) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = jittered_grid(width, height, 0.5, &mut rng);
        let tri = Triangulation::new(&points).unwrap();
        let samples = vec![CellSamples::default(); points.len()];
        let (cells, stats) = build_cells(&points, &tri, &samples);
        (points, cells, stats)
    }

    #[test]
    fn neighbors_are_bidirectional() {
        let (_, cells, _) = grid_graph(15, 12, 3);
        for cell in &cells {
            for &neighbor_id in &cell.neighbors {
                let neighbor = &cells[neighbor_id as usize];
                assert!(
                    neighbor.neighbors.contains(&cell.id),
                    "Cell {} has neighbor {}, but {} does not have {} as neighbor",
                    cell.id,
                    neighbor_id,
                    neighbor_id,
                    cell.id
                );
            }
        }
    }

    #[test]
    fn no_empty_neighbor_lists_after_build() {
        let (_, cells, _) = grid_graph(15, 12, 4);
        assert!(!cells.is_empty());
        for cell in &cells {
            assert!(!cell.neighbors.is_empty(), "Cell {} is isolated", cell.id);
        }
    }

    #[test]
    fn ids_are_dense_and_unique_neighbors() {
        let (_, cells, _) = grid_graph(12, 10, 5);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.id as usize, i);
            let unique: HashSet<CellId> = cell.neighbors.iter().copied().collect();
            assert_eq!(unique.len(), cell.neighbors.len(), "Cell {} has duplicates", i);
            assert!(!cell.neighbors.contains(&cell.id), "Cell {} neighbors itself", i);
        }
    }

    #[test]
    fn rings_and_bearings_are_consistent() {
        let (points, cells, _) = grid_graph(12, 10, 6);
        for cell in &cells {
            assert!(cell.vertices.len() >= 3);
            assert_eq!(cell.vertices.len(), cell.corners.len());
            assert_eq!(cell.neighbor_bearings.len(), cell.neighbors.len());
            assert_eq!(cell.position, points[cell.point_index]);
        }
    }

    #[test]
    fn interior_points_become_cells() {
        let (_, cells, stats) = grid_graph(12, 10, 7);
        assert_eq!(stats.points, 120);
        // Only hull points may lose their ring.
        assert!(
            cells.len() >= (10 * 8),
            "Expected at least the interior cells, got {}",
            cells.len()
        );
        assert_eq!(stats.points, cells.len() + stats.degenerate_rings + stats.isolated_cells);
    }

    #[test]
    fn interior_cells_have_about_six_neighbors() {
        let (_, cells, _) = grid_graph(16, 16, 8);
        let total: usize = cells.iter().map(|c| c.neighbors.len()).sum();
        let avg = total as f64 / cells.len() as f64;
        assert!(avg > 4.0 && avg < 7.0, "Average degree {:.2}", avg);
    }

    #[test]
    fn hexagon_center_is_removed_as_isolated() {
        let mut points = vec![Point::new(0.0, 0.0)];
        for i in 0..6 {
            let angle = (i as f64) * std::f64::consts::PI / 3.0;
            points.push(Point::new(angle.cos(), angle.sin()));
        }
        let tri = Triangulation::new(&points).unwrap();
        let samples = vec![CellSamples::default(); points.len()];
        let (cells, stats) = build_cells(&points, &tri, &samples);

        // Hull rings are too short, so the center keeps no neighbor and goes too.
        assert!(cells.is_empty());
        assert_eq!(stats.degenerate_rings, 6);
        assert_eq!(stats.isolated_cells, 1);
    }

    #[test]
    fn samples_are_carried_to_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let points = jittered_grid(8, 8, 0.4, &mut rng);
        let tri = Triangulation::new(&points).unwrap();
        let samples: Vec<CellSamples> = (0..points.len())
            .map(|i| CellSamples {
                elevation: i as f32 / 100.0,
                ..CellSamples::default()
            })
            .collect();
        let (cells, _) = build_cells(&points, &tri, &samples);
        for cell in &cells {
            assert_eq!(cell.elevation, cell.point_index as f32 / 100.0);
        }
    }
}
