use serde::{Deserialize, Serialize};

use crate::routing::bucket_queue::{BucketQueue, NO_NODE};

/// Read-only view of a graph for [`PathFinder`].
///
/// Nodes are dense indices in `0..node_count()`. Traversal filters belong in
/// `neighbors`: a node the search should not enter is simply not yielded.
pub trait SearchGraph {
    fn node_count(&self) -> usize;

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_;

    /// Cost of the step `from -> to`. Only called for `to` yielded by `neighbors(from)`.
    fn cost(&self, from: usize, to: usize) -> u32;

    /// Estimate of the remaining cost from `node` to `target`.
    fn heuristic(&self, _node: usize, _target: usize) -> u32 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Source first, target last.
    pub nodes: Vec<usize>,
    pub cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unseen,
    Open,
    Closed,
}

/// Per-search scratch arrays, indexed by node.
#[derive(Debug, Clone, Default)]
pub struct SearchWorkspace {
    distance: Vec<u32>,
    heuristic: Vec<u32>,
    predecessor: Vec<usize>,
    links: Vec<usize>,
    state: Vec<NodeState>,
}

impl SearchWorkspace {
    fn reset(&mut self, node_count: usize) {
        self.distance.clear();
        self.distance.resize(node_count, u32::MAX);
        self.heuristic.clear();
        self.heuristic.resize(node_count, 0);
        self.predecessor.clear();
        self.predecessor.resize(node_count, NO_NODE);
        self.links.clear();
        self.links.resize(node_count, NO_NODE);
        self.state.clear();
        self.state.resize(node_count, NodeState::Unseen);
    }

    fn priority(&self, node: usize) -> u32 {
        self.distance[node].saturating_add(self.heuristic[node])
    }

    fn trace(&self, source: usize, target: usize) -> Path {
        let mut nodes = vec![target];
        let mut current = target;
        while current != source {
            current = self.predecessor[current];
            nodes.push(current);
        }
        nodes.reverse();
        Path {
            nodes,
            cost: self.distance[target],
        }
    }
}

/// Reusable shortest-path searcher.
///
/// Orders the frontier by `distance + heuristic`. The heuristic is only a
/// guide and may overestimate, so a node that is reached more cheaply after
/// it was expanded is reopened. Results are good paths, not guaranteed
/// optimal ones.
///
/// Owns its scratch state, so one `PathFinder` per thread is enough to run
/// independent searches in parallel over a shared graph.
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    workspace: SearchWorkspace,
    queue: BucketQueue,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a path from `source` to `target`.
    ///
    /// Returns `None` if `target` cannot be reached. `source == target`
    /// yields the single-node path with cost 0.
    ///
    /// # Panics
    /// Panics if `source` or `target` is not a node of `graph`.
    pub fn shortest_path<G: SearchGraph>(&mut self, graph: &G, source: usize, target: usize) -> Option<Path> {
        let node_count = graph.node_count();
        assert!(
            source < node_count && target < node_count,
            "Search from {} to {} in a graph of {} nodes",
            source,
            target,
            node_count
        );
        if source == target {
            return Some(Path {
                nodes: vec![source],
                cost: 0,
            });
        }

        let PathFinder { workspace: ws, queue } = self;
        ws.reset(node_count);
        queue.clear();

        ws.distance[source] = 0;
        ws.heuristic[source] = graph.heuristic(source, target);
        ws.state[source] = NodeState::Open;
        queue.enqueue(source, ws.priority(source), &mut ws.links);

        while let Some(current) = queue.dequeue(&mut ws.links) {
            ws.state[current] = NodeState::Closed;
            if current == target {
                return Some(ws.trace(source, target));
            }

            let base = ws.distance[current];
            for next in graph.neighbors(current) {
                let distance = base.saturating_add(graph.cost(current, next));
                match ws.state[next] {
                    NodeState::Unseen => {
                        ws.distance[next] = distance;
                        ws.heuristic[next] = graph.heuristic(next, target);
                        ws.predecessor[next] = current;
                        ws.state[next] = NodeState::Open;
                        queue.enqueue(next, ws.priority(next), &mut ws.links);
                    }
                    NodeState::Open if distance < ws.distance[next] => {
                        let old = ws.priority(next);
                        ws.distance[next] = distance;
                        ws.predecessor[next] = current;
                        queue.decrease_key(next, old, ws.priority(next), &mut ws.links);
                    }
                    NodeState::Closed if distance < ws.distance[next] => {
                        ws.distance[next] = distance;
                        ws.predecessor[next] = current;
                        ws.state[next] = NodeState::Open;
                        queue.enqueue(next, ws.priority(next), &mut ws.links);
                    }
                    _ => {}
                }
            }
        }

        None
    }

    /// Cost of the path [`PathFinder::shortest_path`] would return.
    pub fn distance<G: SearchGraph>(&mut self, graph: &G, source: usize, target: usize) -> Option<u32> {
        self.shortest_path(graph, source, target).map(|p| p.cost)
    }
}
