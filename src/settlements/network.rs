use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::generation::SettlementParams;
use crate::routing::search::{Path, PathFinder, SearchGraph};
use crate::routing::terrain::{CellPath, TraversalFilter, cell_to_cell_path};
use crate::settlements::placement::{create_ports, place_cities, proto_route_traffic};
use crate::settlements::{City, NodeId, Port, WayNode};
use crate::world::World;
use crate::world::cell::{Cell, CellId, Point};

/// Cities and ports with the roads and sea lanes between them.
///
/// Nodes are stored in one arena: cities first, then ports. The network is
/// also a [`SearchGraph`] whose heuristic is the straight-line distance
/// between anchor cells times `heuristic_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementNetwork {
    pub nodes: Vec<WayNode>,
    /// Cell paths of all accepted land connections.
    pub roads: Vec<Vec<CellId>>,
    /// Cell paths of all accepted sea connections.
    pub sea_lanes: Vec<Vec<CellId>>,
    /// City owning each cell, indexed by `CellId`.
    pub cell_owner: Vec<Option<NodeId>>,
    /// Proto trade route count per cell, indexed by `CellId`.
    pub route_traffic: Vec<u32>,
    positions: Vec<Point>,
    adjacency: Vec<Vec<(NodeId, u32)>>,
    heuristic_scale: f64,
}

/// One accepted connection found while scanning from a node.
struct Connection {
    to: NodeId,
    cost: u32,
    cells: Vec<CellId>,
}

/// Build the settlement network of a generated world.
///
/// Uses its own RNG stream derived from the world seed, so the result is
/// reproducible for a given world.
pub fn build_settlements(world: &World) -> SettlementNetwork {
    let mut rng = ChaCha8Rng::seed_from_u64(world.seed().wrapping_add(1));
    SettlementNetwork::build(world, &world.generation_params.settlements, &mut rng)
}

impl SettlementNetwork {
    /// Place cities and ports on `world` and connect them.
    pub fn build(world: &World, params: &SettlementParams, rng: &mut impl Rng) -> Self {
        let cells = &world.cells;
        if world.land_cells.is_empty() {
            warn!("No land cells, settlement network is empty");
        }

        let route_traffic = proto_route_traffic(cells, params.proto_route_share, params.heuristic_scale, rng);
        let (mut cities, cell_owner) = place_cities(cells, &world.land_cells, &route_traffic, rng);
        let first_port = cities.len();
        let ports = create_ports(cells, &mut cities, &cell_owner, first_port, params.heuristic_scale);

        let nodes: Vec<WayNode> = cities
            .into_iter()
            .map(WayNode::City)
            .chain(ports.into_iter().map(WayNode::Port))
            .collect();
        let mut network = Self::from_nodes(nodes, cells, params.heuristic_scale);
        network.cell_owner = cell_owner;
        network.route_traffic = route_traffic;

        network.connect_by_land(cells, params);
        network.connect_by_sea(cells, params);
        network.rebuild_adjacency();

        info!(
            cities = network.cities().count(),
            ports = network.ports().count(),
            roads = network.roads.len(),
            sea_lanes = network.sea_lanes.len(),
            "Built settlement network"
        );
        network
    }

    /// Wrap existing nodes; node ids must equal their index.
    ///
    /// # Panics
    /// Panics if a node id does not match its index.
    pub fn from_nodes(nodes: Vec<WayNode>, cells: &[Cell], heuristic_scale: f64) -> Self {
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.id(), i, "Node at index {} has id {}", i, node.id());
        }
        let positions = nodes.iter().map(|n| cells[n.cell() as usize].position).collect();
        let mut network = SettlementNetwork {
            nodes,
            roads: Vec::new(),
            sea_lanes: Vec::new(),
            cell_owner: vec![None; cells.len()],
            route_traffic: vec![0; cells.len()],
            positions,
            adjacency: Vec::new(),
            heuristic_scale,
        };
        network.rebuild_adjacency();
        network
    }

    pub fn node(&self, id: NodeId) -> &WayNode {
        &self.nodes[id]
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.nodes.iter().filter_map(WayNode::as_city)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.nodes.iter().filter_map(WayNode::as_port)
    }

    /// Outgoing edges of `node` with their costs.
    pub fn edges(&self, node: NodeId) -> &[(NodeId, u32)] {
        &self.adjacency[node]
    }

    /// Position of the anchor cell of `node`.
    pub fn position(&self, node: NodeId) -> Point {
        self.positions[node]
    }

    /// Recompute the edge lists after node connections changed.
    pub fn rebuild_adjacency(&mut self) {
        self.adjacency = self.nodes.iter().map(WayNode::edges).collect();
    }

    /// Best route between two cities through the road, port and sea lane graph.
    ///
    /// # Panics
    /// Panics if either id is not a city.
    pub fn city_to_city_path(&self, finder: &mut PathFinder, from: NodeId, to: NodeId) -> Option<Path> {
        assert!(self.nodes[from].is_city(), "Node {} is not a city", from);
        assert!(self.nodes[to].is_city(), "Node {} is not a city", to);
        finder.shortest_path(self, from, to)
    }

    pub fn city_to_city_distance(&self, finder: &mut PathFinder, from: NodeId, to: NodeId) -> Option<u32> {
        self.city_to_city_path(finder, from, to).map(|p| p.cost)
    }

    /// Connect every city to nearby cities by land.
    fn connect_by_land(&mut self, cells: &[Cell], params: &SettlementParams) {
        let cities: Vec<(NodeId, CellId)> = self.cities().map(|c| (c.id, c.cell)).collect();
        let found: Vec<Vec<Connection>> = cities
            .par_iter()
            .map_init(PathFinder::new, |finder, &(city, _)| {
                self.scan_connections(finder, cells, city, &cities, TraversalFilter::LandOnly, params)
            })
            .collect();

        for (&(city, _), connections) in cities.iter().zip(found) {
            for connection in connections {
                if let WayNode::City(c) = &mut self.nodes[city] {
                    c.connect_by_land(connection.to, connection.cost);
                }
                self.roads.push(connection.cells);
            }
        }
        debug!(roads = self.roads.len(), "Connected cities by land");
    }

    /// Connect every port to nearby ports by sea, with the same rules as roads.
    fn connect_by_sea(&mut self, cells: &[Cell], params: &SettlementParams) {
        let ports: Vec<(NodeId, CellId)> = self.ports().map(|p| (p.id, p.cell)).collect();
        let found: Vec<Vec<Connection>> = ports
            .par_iter()
            .map_init(PathFinder::new, |finder, &(port, _)| {
                self.scan_connections(finder, cells, port, &ports, TraversalFilter::WaterOnly, params)
            })
            .collect();

        for (&(port, _), connections) in ports.iter().zip(found) {
            for connection in connections {
                if let WayNode::Port(p) = &mut self.nodes[port] {
                    p.sea_connections.push((connection.to, connection.cost));
                }
                self.sea_lanes.push(connection.cells);
            }
        }
        debug!(sea_lanes = self.sea_lanes.len(), "Connected ports by sea");
    }

    /// Scan `peers` nearest first and keep every valid cell path from `node`.
    ///
    /// A path that crosses the territory of a city owning neither end is
    /// invalid; after `connection_tolerance` invalid paths the next one ends
    /// the scan. Peers without a path are skipped.
    fn scan_connections(
        &self,
        finder: &mut PathFinder,
        cells: &[Cell],
        node: NodeId,
        peers: &[(NodeId, CellId)],
        filter: TraversalFilter,
        params: &SettlementParams,
    ) -> Vec<Connection> {
        let from_cell = self.nodes[node].cell();
        let from_city = self.owner_city(node);
        let mut tolerance = params.connection_tolerance;
        let mut connections = Vec::new();

        for (to, to_cell) in self.nearest_first(node, peers) {
            let Some(path) = cell_to_cell_path(finder, cells, from_cell, to_cell, filter, params.heuristic_scale)
            else {
                continue;
            };
            if crosses_foreign_territory(&path, &self.cell_owner, from_city, self.owner_city(to)) {
                if tolerance == 0 {
                    break;
                }
                tolerance -= 1;
                continue;
            }
            connections.push(Connection {
                to,
                cost: path.cost,
                cells: path.cells,
            });
        }
        connections
    }

    /// City that owns `node`: itself for a city, the owner for a port.
    fn owner_city(&self, node: NodeId) -> NodeId {
        match &self.nodes[node] {
            WayNode::City(city) => city.id,
            WayNode::Port(port) => port.city,
        }
    }

    /// `peers` without `node`, sorted by straight-line distance from `node`.
    fn nearest_first(&self, node: NodeId, peers: &[(NodeId, CellId)]) -> Vec<(NodeId, CellId)> {
        let origin = self.positions[node];
        let mut sorted: Vec<(NodeId, CellId)> = peers.iter().copied().filter(|&(n, _)| n != node).collect();
        sorted.sort_by(|a, b| {
            let da = origin.distance_to(&self.positions[a.0]);
            let db = origin.distance_to(&self.positions[b.0]);
            da.total_cmp(&db).then(a.0.cmp(&b.0))
        });
        sorted
    }
}

/// True if any cell of `path` but the last is owned by a city other than `a` and `b`.
fn crosses_foreign_territory(path: &CellPath, cell_owner: &[Option<NodeId>], a: NodeId, b: NodeId) -> bool {
    let inner = &path.cells[..path.cells.len().saturating_sub(1)];
    inner
        .iter()
        .any(|&c| matches!(cell_owner[c as usize], Some(owner) if owner != a && owner != b))
}

impl SearchGraph for SettlementNetwork {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[node].iter().map(|&(n, _)| n)
    }

    fn cost(&self, from: usize, to: usize) -> u32 {
        self.adjacency[from]
            .iter()
            .find(|&&(n, _)| n == to)
            .map(|&(_, cost)| cost)
            .unwrap_or_else(|| panic!("No edge from node {} to node {}", from, to))
    }

    fn heuristic(&self, node: usize, target: usize) -> u32 {
        let d = self.positions[node].distance_to(&self.positions[target]);
        (d * self.heuristic_scale).round() as u32
    }
}
