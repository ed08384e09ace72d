use serde::{Deserialize, Serialize};

use crate::settlements::NodeId;
use crate::settlements::network::SettlementNetwork;

/// A simple path found by [`discover_routes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoute {
    /// Every node of the path, ports included, starting at the origin.
    pub nodes: Vec<NodeId>,
    /// The cities of `nodes`, in path order.
    pub cities: Vec<NodeId>,
    /// Sum of edge costs along `nodes`.
    pub cost: u32,
}

struct Frame {
    node: NodeId,
    remaining: u32,
    cost: u32,
    next_edge: usize,
    /// Distance from the origin of the node reached by the last city-to-city step.
    progress: f64,
    extended: bool,
}

/// Enumerate the simple paths from `start` that fit in `budget`.
///
/// Depth first over the settlement graph. A step is taken only if its cost
/// fits in the remaining budget, it does not revisit a node on the current
/// path, and it does not fall back closer to `start` than the node reached
/// by the latest road step between two cities, which keeps routes moving
/// outward from `start`. A path that cannot be extended any further is
/// emitted. Paths of a single node are not routes and are never emitted.
///
/// This is an enumeration, not a search: the number of routes grows quickly
/// with the budget. The emission order is unspecified.
pub fn discover_routes(network: &SettlementNetwork, start: NodeId, budget: u32) -> Vec<CandidateRoute> {
    let origin = network.position(start);
    let origin_distance = |node: NodeId| origin.distance_to(&network.position(node));

    let mut routes = Vec::new();
    let mut on_path = vec![false; network.nodes.len()];
    let mut path = vec![start];
    on_path[start] = true;
    let mut stack = vec![Frame {
        node: start,
        remaining: budget,
        cost: 0,
        next_edge: 0,
        progress: 0.0,
        extended: false,
    }];

    while let Some(top) = stack.last_mut() {
        let edges = network.edges(top.node);
        let mut step = None;
        while top.next_edge < edges.len() {
            let (next, cost) = edges[top.next_edge];
            top.next_edge += 1;
            if cost > top.remaining || on_path[next] || origin_distance(next) < top.progress {
                continue;
            }
            step = Some((next, cost));
            break;
        }

        match step {
            Some((next, cost)) => {
                top.extended = true;
                let road = network.node(top.node).is_city() && network.node(next).is_city();
                let progress = if road { origin_distance(next) } else { top.progress };
                let frame = Frame {
                    node: next,
                    remaining: top.remaining - cost,
                    cost: top.cost + cost,
                    next_edge: 0,
                    progress,
                    extended: false,
                };
                on_path[next] = true;
                path.push(next);
                stack.push(frame);
            }
            None => {
                let (node, cost, extended) = (top.node, top.cost, top.extended);
                stack.pop();
                if !extended && path.len() > 1 {
                    routes.push(CandidateRoute {
                        cities: path.iter().copied().filter(|&n| network.node(n).is_city()).collect(),
                        nodes: path.clone(),
                        cost,
                    });
                }
                on_path[node] = false;
                path.pop();
            }
        }
    }

    routes
}
