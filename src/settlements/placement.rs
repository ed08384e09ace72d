use std::cmp::Reverse;
use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::debug;

use crate::routing::search::PathFinder;
use crate::routing::terrain::{TraversalFilter, cell_to_cell_path};
use crate::settlements::{City, NodeId, Port};
use crate::world::cell::{Cell, CellId};
use crate::world::water::flood_fill;

/// Count how many proto trade routes pass through or alongside each cell.
///
/// For every ordered pair of distinct map sides, `share` of each side's
/// border cells are sampled and paired up; each pair with a land source is
/// routed with the trade cost. Every cell on a route gains one point, and
/// each land cell next to a water stretch of the route gains one point per
/// route.
pub fn proto_route_traffic(cells: &[Cell], share: f32, heuristic_scale: f64, rng: &mut impl Rng) -> Vec<u32> {
    let sides: [Vec<CellId>; 4] = [
        border_side(cells, |c| c.border.north),
        border_side(cells, |c| c.border.east),
        border_side(cells, |c| c.border.south),
        border_side(cells, |c| c.border.west),
    ];

    let mut pairs: Vec<(CellId, CellId)> = Vec::new();
    for (i, from) in sides.iter().enumerate() {
        for (j, to) in sides.iter().enumerate() {
            if i == j {
                continue;
            }
            let sources: Vec<CellId> = from
                .choose_multiple(rng, sample_size(from.len(), share))
                .copied()
                .collect();
            let targets: Vec<CellId> = to
                .choose_multiple(rng, sample_size(to.len(), share))
                .copied()
                .collect();
            pairs.extend(
                sources
                    .into_iter()
                    .zip(targets)
                    .filter(|&(source, _)| !cells[source as usize].is_water),
            );
        }
    }

    let routes: Vec<Vec<CellId>> = pairs
        .par_iter()
        .map_init(PathFinder::new, |finder, &(source, target)| {
            cell_to_cell_path(finder, cells, source, target, TraversalFilter::Any, heuristic_scale)
                .map(|path| path.cells)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    let mut traffic = vec![0u32; cells.len()];
    for route in &routes {
        add_route_traffic(cells, route, &mut traffic);
    }

    debug!(pairs = pairs.len(), routes = routes.len(), "Traced proto trade routes");
    traffic
}

/// Add one route to `traffic`: one point per route cell, and one point for
/// each land cell bordering the route's water cells, however many it borders.
fn add_route_traffic(cells: &[Cell], route: &[CellId], traffic: &mut [u32]) {
    let mut rewarded: HashSet<CellId> = HashSet::new();
    for &id in route {
        traffic[id as usize] += 1;
        let cell = &cells[id as usize];
        if !cell.is_water {
            continue;
        }
        for &n in &cell.neighbors {
            if !cells[n as usize].is_water && rewarded.insert(n) {
                traffic[n as usize] += 1;
            }
        }
    }
}

fn border_side(cells: &[Cell], on_side: impl Fn(&Cell) -> bool) -> Vec<CellId> {
    cells.iter().filter(|c| on_side(c)).map(|c| c.id).collect()
}

fn sample_size(len: usize, share: f32) -> usize {
    ((len as f32 * share).round() as usize).min(len)
}

/// Found cities on the busiest land cells.
///
/// Candidates are shuffled, then stably sorted by traffic so ties are broken
/// at random. A candidate is taken if neither it nor any neighbor is owned
/// yet; the new city claims its cell and all neighbors. Returns the cities
/// (ids `0..n`) and the owning city of every cell.
pub fn place_cities(
    cells: &[Cell],
    land_cells: &[CellId],
    traffic: &[u32],
    rng: &mut impl Rng,
) -> (Vec<City>, Vec<Option<NodeId>>) {
    let mut candidates = land_cells.to_vec();
    candidates.shuffle(rng);
    candidates.sort_by_key(|&c| Reverse(traffic[c as usize]));

    let mut owner: Vec<Option<NodeId>> = vec![None; cells.len()];
    let mut cities: Vec<City> = Vec::new();
    for id in candidates {
        let cell = &cells[id as usize];
        if owner[id as usize].is_some() || cell.neighbors.iter().any(|&n| owner[n as usize].is_some()) {
            continue;
        }
        let city_id = cities.len();
        let mut terrain = vec![id];
        terrain.extend(cell.neighbors.iter().copied());
        for &t in &terrain {
            owner[t as usize] = Some(city_id);
        }
        cities.push(City::new(city_id, id, terrain));
    }

    debug!(cities = cities.len(), "Placed cities");
    (cities, owner)
}

/// Create one port per harbor, a connected patch of coastal water owned by
/// one city, and link it to its city.
///
/// Port ids start at `first_id`. A harbor the city cannot reach produces no
/// port.
pub fn create_ports(
    cells: &[Cell],
    cities: &mut [City],
    owner: &[Option<NodeId>],
    first_id: NodeId,
    heuristic_scale: f64,
) -> Vec<Port> {
    let mut finder = PathFinder::new();
    let mut ports: Vec<Port> = Vec::new();

    for city in cities.iter_mut() {
        let mut in_harbor: HashSet<CellId> = HashSet::new();
        let mut harbors: Vec<Vec<CellId>> = Vec::new();
        for &id in &city.terrain {
            let cell = &cells[id as usize];
            if !cell.is_water || cell.is_deep_water || in_harbor.contains(&id) {
                continue;
            }
            let harbor = flood_fill(cells, id, |c| {
                c.is_water && !c.is_deep_water && owner[c.id as usize] == Some(city.id)
            });
            in_harbor.extend(harbor.iter().copied());
            harbors.push(harbor);
        }

        for harbor in harbors {
            let Some(path) = cell_to_cell_path(
                &mut finder,
                cells,
                city.cell,
                harbor[0],
                TraversalFilter::Any,
                heuristic_scale,
            ) else {
                debug!(city = city.id, cell = harbor[0], "Harbor unreachable from its city");
                continue;
            };
            let port = Port::new(first_id + ports.len(), city.id, harbor, path.cost);
            city.ports.push((port.id, port.city_cost));
            ports.push(port);
        }
    }

    debug!(ports = ports.len(), "Created ports");
    ports
}
