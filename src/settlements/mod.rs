pub mod discovery;
pub mod network;
pub mod placement;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::cell::CellId;

pub use discovery::{CandidateRoute, discover_routes};
pub use network::{SettlementNetwork, build_settlements};

/// Index into [`SettlementNetwork::nodes`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: NodeId,
    /// Anchor cell.
    pub cell: CellId,
    /// Anchor plus every claimed neighbor cell.
    pub terrain: Vec<CellId>,
    /// Cities reachable by road, in the order they were connected.
    pub neighbors: Vec<NodeId>,
    /// Road cost to each neighbor city.
    pub land_connections: BTreeMap<NodeId, u32>,
    /// Ports of this city with the cost from the city cell to the port cell.
    pub ports: Vec<(NodeId, u32)>,
}

impl City {
    pub fn new(id: NodeId, cell: CellId, terrain: Vec<CellId>) -> Self {
        City {
            id,
            cell,
            terrain,
            neighbors: Vec::new(),
            land_connections: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    pub fn connect_by_land(&mut self, other: NodeId, cost: u32) {
        if self.land_connections.insert(other, cost).is_none() {
            self.neighbors.push(other);
        }
    }
}

/// Harbor access point of a city, anchored on a coastal water cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: NodeId,
    pub cell: CellId,
    pub city: NodeId,
    /// Connected coastal water cells owned by `city`; `cell` comes first.
    pub harbor: Vec<CellId>,
    /// Cost from the city cell to `cell`.
    pub city_cost: u32,
    pub sea_connections: Vec<(NodeId, u32)>,
}

impl Port {
    /// # Panics
    /// Panics if `harbor` is empty.
    pub fn new(id: NodeId, city: NodeId, harbor: Vec<CellId>, city_cost: u32) -> Self {
        Port {
            id,
            cell: harbor[0],
            city,
            harbor,
            city_cost,
            sea_connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WayNode {
    City(City),
    Port(Port),
}

impl WayNode {
    pub fn id(&self) -> NodeId {
        match self {
            WayNode::City(city) => city.id,
            WayNode::Port(port) => port.id,
        }
    }

    pub fn cell(&self) -> CellId {
        match self {
            WayNode::City(city) => city.cell,
            WayNode::Port(port) => port.cell,
        }
    }

    pub fn is_city(&self) -> bool {
        matches!(self, WayNode::City(_))
    }

    pub fn as_city(&self) -> Option<&City> {
        match self {
            WayNode::City(city) => Some(city),
            WayNode::Port(_) => None,
        }
    }

    pub fn as_port(&self) -> Option<&Port> {
        match self {
            WayNode::Port(port) => Some(port),
            WayNode::City(_) => None,
        }
    }

    /// Outgoing edges with their costs: roads and own ports for a city, the
    /// owning city and sea lanes for a port.
    pub fn edges(&self) -> Vec<(NodeId, u32)> {
        match self {
            WayNode::City(city) => city
                .neighbors
                .iter()
                .map(|n| (*n, city.land_connections[n]))
                .chain(city.ports.iter().copied())
                .collect(),
            WayNode::Port(port) => std::iter::once((port.city, port.city_cost))
                .chain(port.sea_connections.iter().copied())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_edges_list_roads_then_ports() {
        let mut city = City::new(0, 10, vec![10, 11]);
        city.connect_by_land(2, 50);
        city.connect_by_land(1, 30);
        city.ports.push((5, 40));
        let node = WayNode::City(city);
        assert_eq!(node.edges(), vec![(2, 50), (1, 30), (5, 40)]);
        assert!(node.is_city());
        assert_eq!(node.cell(), 10);
    }

    #[test]
    fn reconnecting_updates_cost_without_duplicates() {
        let mut city = City::new(0, 0, vec![0]);
        city.connect_by_land(3, 10);
        city.connect_by_land(3, 12);
        assert_eq!(city.neighbors, vec![3]);
        assert_eq!(city.land_connections[&3], 12);
    }

    #[test]
    fn port_edges_start_with_owner() {
        let mut port = Port::new(4, 1, vec![20, 21], 40);
        port.sea_connections.push((6, 90));
        let node = WayNode::Port(port);
        assert_eq!(node.edges(), vec![(1, 40), (6, 90)]);
        assert_eq!(node.cell(), 20);
        assert_eq!(node.id(), 4);
        assert!(node.as_city().is_none());
    }
}
