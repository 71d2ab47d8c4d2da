// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};

use crate::{Graph, Node, PlanError, DEFAULT_STEP_LIMIT};

/// Factor converting caller-facing percentage coordinates ([0, 100] per axis)
/// to the graph's internal normalized scale.
const PERCENT_TO_INTERNAL: f32 = 0.01;

/// Phase of a [RoutePlanner] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Start and end nodes are resolved; the search has not been started.
    Initialized,

    /// The search loop is in progress (observable after a
    /// [PlanError::StepLimitExceeded] interruption).
    Searching,

    /// The end node was reached; the path and its distance are available.
    Found,

    /// The frontier emptied without reaching the end node: no path exists
    /// in the component reachable from the start. A normal outcome, not
    /// an error.
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct FrontierItem {
    node_id: i64,
    score: f32,
    seq: u64,
}

impl PartialEq for FrontierItem {
    fn eq(&self, other: &Self) -> bool {
        self.score.eq(&other.score) && self.seq.eq(&other.seq)
    }
}

impl PartialOrd for FrontierItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // NOTE: We revert the order of comparison,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        // Score ties go to the earlier-admitted node.
        match other.score.partial_cmp(&self.score) {
            Some(std::cmp::Ordering::Equal) => Some(other.seq.cmp(&self.seq)),
            ord => ord,
        }
    }
}

impl Eq for FrontierItem {}

impl Ord for FrontierItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

/// Per-session search scratch for one discovered node.
///
/// Presence in the planner's visited map is what "visited" means: a node
/// gets a state exactly once, at first discovery, and the state is never
/// revised.
#[derive(Debug, Clone, Copy)]
struct NodeState {
    /// Accumulated path cost from the start node, in internal units.
    g: f32,

    /// Straight-line distance to the end node.
    h: f32,

    /// The node this one was discovered from; [None] only for the start node.
    parent: Option<i64>,
}

/// A single shortest-path search session over a borrowed [Graph].
///
/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// with a straight-line heuristic. A node's cost and back-pointer are fixed at
/// first discovery and never relaxed afterwards; this still yields shortest
/// paths because the heuristic is consistent and edge costs are non-negative,
/// so nodes leave the frontier in non-decreasing order of estimated total cost.
///
/// All search state lives on the planner, never on the graph, so any number
/// of sessions may run over one [Graph] at the same time.
#[derive(Debug)]
pub struct RoutePlanner<'a> {
    graph: &'a Graph,
    start: Node,
    end: Node,
    frontier: BinaryHeap<FrontierItem>,
    visited: HashMap<i64, NodeState>,
    next_seq: u64,
    step_limit: usize,
    status: SearchStatus,
    path: Vec<Node>,
    distance: f32,
}

impl<'a> RoutePlanner<'a> {
    /// Creates a search session between two positions given on a
    /// percentage scale ([0, 100] per axis).
    ///
    /// Each position is normalized and resolved to the nearest graph node.
    /// Out-of-range positions are not an error and resolve to the nearest
    /// available node; only an empty graph makes construction fail.
    pub fn new(
        graph: &'a Graph,
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
    ) -> Result<Self, PlanError> {
        let start = graph
            .find_nearest_node(start_x * PERCENT_TO_INTERNAL, start_y * PERCENT_TO_INTERNAL)
            .ok_or(PlanError::EmptyGraph)?;
        let end = graph
            .find_nearest_node(end_x * PERCENT_TO_INTERNAL, end_y * PERCENT_TO_INTERNAL)
            .ok_or(PlanError::EmptyGraph)?;

        log::debug!(
            "resolved start ({}, {}) to node {} and end ({}, {}) to node {}",
            start_x,
            start_y,
            start.id,
            end_x,
            end_y,
            end.id,
        );

        Ok(Self {
            graph,
            start,
            end,
            frontier: BinaryHeap::new(),
            visited: HashMap::new(),
            next_seq: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            status: SearchStatus::Initialized,
            path: Vec::new(),
            distance: 0.0,
        })
    }

    /// Caps the number of node expansions performed by a single [run](Self::run)
    /// call. The default is [DEFAULT_STEP_LIMIT].
    ///
    /// Concluding that no route exists requires expanding all nodes accessible
    /// from the start, which is usually very time-consuming, especially on
    /// large datasets (like the whole planet). The step limit protects
    /// against resource exhaustion.
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// The graph node resolved from the start position.
    pub fn start_node(&self) -> Node {
        self.start
    }

    /// The graph node resolved from the end position.
    pub fn end_node(&self) -> Node {
        self.end
    }

    /// Current phase of this session.
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// The found path, ordered start to end. Empty unless
    /// [status](Self::status) is [SearchStatus::Found].
    pub fn path(&self) -> &[Node] {
        &self.path
    }

    /// Total real-world distance of the found path (internal path cost
    /// multiplied by [Graph::metric_scale]). 0.0 unless
    /// [status](Self::status) is [SearchStatus::Found].
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Runs the search to completion.
    ///
    /// Returns the terminal status: [SearchStatus::Found] when a path was
    /// reconstructed, [SearchStatus::Exhausted] when no path exists. Calling
    /// [run](Self::run) again after a terminal status returns that status
    /// without searching again.
    ///
    /// When the step limit is hit, [PlanError::StepLimitExceeded] is returned
    /// and the session stays in [SearchStatus::Searching]; a subsequent call
    /// resumes where the previous one stopped, allowing up to
    /// [step_limit](Self::with_step_limit) further expansions.
    pub fn run(&mut self) -> Result<SearchStatus, PlanError> {
        match self.status {
            SearchStatus::Found | SearchStatus::Exhausted => return Ok(self.status),
            SearchStatus::Initialized => {
                let start = self.start;
                let h = start.distance(&self.end);
                self.admit(start.id, NodeState {
                    g: 0.0,
                    h,
                    parent: None,
                });
                self.status = SearchStatus::Searching;
            }
            SearchStatus::Searching => {} // resuming after a step-limit interruption
        }

        let mut steps: usize = 0;
        while let Some(item) = self.frontier.pop() {
            if item.node_id == self.end.id {
                self.reconstruct();
                self.status = SearchStatus::Found;
                log::debug!(
                    "route found: {} nodes, distance {}",
                    self.path.len(),
                    self.distance,
                );
                return Ok(self.status);
            }

            steps += 1;
            if steps > self.step_limit {
                // The popped item was not expanded; put it back so that
                // a subsequent run call can resume losslessly.
                self.frontier.push(item);
                return Err(PlanError::StepLimitExceeded);
            }

            self.expand(item.node_id);
        }

        self.status = SearchStatus::Exhausted;
        log::debug!(
            "frontier exhausted after visiting {} nodes; no route from {} to {}",
            self.visited.len(),
            self.start.id,
            self.end.id,
        );
        Ok(self.status)
    }

    /// Admits a newly discovered node into the frontier.
    fn admit(&mut self, node_id: i64, state: NodeState) {
        debug_assert!(!self.visited.contains_key(&node_id));
        self.frontier.push(FrontierItem {
            node_id,
            score: state.g + state.h,
            seq: self.next_seq,
        });
        self.visited.insert(node_id, state);
        self.next_seq += 1;
    }

    /// Discovers all not-yet-visited neighbors of the selected node.
    ///
    /// A neighbor's cost and parent are fixed here, at first discovery;
    /// already-visited neighbors are skipped without relaxation.
    fn expand(&mut self, current_id: i64) {
        let graph = self.graph;
        let end = self.end;

        let Some(current) = graph.get_node(current_id) else {
            return;
        };
        let Some(&NodeState { g: current_g, .. }) = self.visited.get(&current_id) else {
            return;
        };

        for &neighbor_id in graph.neighbors(current_id) {
            if self.visited.contains_key(&neighbor_id) {
                continue;
            }

            // Dangling neighbor ids (left behind by node deletion) are
            // silently skipped.
            if let Some(neighbor) = graph.get_node(neighbor_id) {
                let g = current_g + current.distance(&neighbor);
                let h = neighbor.distance(&end);
                self.admit(neighbor_id, NodeState {
                    g,
                    h,
                    parent: Some(current_id),
                });
            }
        }
    }

    /// Walks parent back-pointers from the end node to the start node,
    /// accumulating the traveled distance, and stores the reversed
    /// (start-to-end) path.
    ///
    /// Panics when a parent is missing before the start node is reached,
    /// as that means the search state is corrupted rather than that no
    /// path exists.
    fn reconstruct(&mut self) {
        let mut raw_distance: f32 = 0.0;
        let mut path = Vec::new();

        let mut at = self.end;
        while at.id != self.start.id {
            let parent_id = match self.visited.get(&at.id).and_then(|state| state.parent) {
                Some(id) => id,
                None => panic!("node {} has no parent during path reconstruction", at.id),
            };
            let parent = match self.graph.get_node(parent_id) {
                Some(node) => node,
                None => panic!("parent node {} is not part of the graph", parent_id),
            };

            raw_distance += at.distance(&parent);
            path.push(at);
            at = parent;
        }
        path.push(at);
        path.reverse();

        self.distance = raw_distance * self.graph.metric_scale();
        self.path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn node(id: i64, x: f32, y: f32) -> Node {
        Node { id, x, y }
    }

    /// A unit square, each edge of length 1:
    ///
    ///  4───3
    ///  │   │
    ///  1───2
    fn square_graph() -> Graph {
        let mut g = Graph::new();
        g.set_node(node(1, 0.0, 0.0));
        g.set_node(node(2, 1.0, 0.0));
        g.set_node(node(3, 1.0, 1.0));
        g.set_node(node(4, 0.0, 1.0));
        g.set_edge_bidirectional(1, 2);
        g.set_edge_bidirectional(2, 3);
        g.set_edge_bidirectional(3, 4);
        g.set_edge_bidirectional(4, 1);
        g
    }

    /// A 3x3 grid with 0.5 spacing:
    ///
    ///  7─8─9
    ///  │ │ │
    ///  4─5─6
    ///  │ │ │
    ///  1─2─3
    fn grid_graph() -> Graph {
        let mut g = Graph::new();
        for row in 0..3i64 {
            for col in 0..3i64 {
                g.set_node(node(row * 3 + col + 1, col as f32 * 0.5, row as f32 * 0.5));
            }
        }
        for row in 0..3i64 {
            for col in 0..3i64 {
                let id = row * 3 + col + 1;
                if col < 2 {
                    g.set_edge_bidirectional(id, id + 1);
                }
                if row < 2 {
                    g.set_edge_bidirectional(id, id + 3);
                }
            }
        }
        g
    }

    fn assert_path_is_walkable(g: &Graph, path: &[Node]) {
        for pair in path.windows(2) {
            assert!(
                g.neighbors(pair[0].id).contains(&pair[1].id),
                "{} -> {} is not an edge",
                pair[0].id,
                pair[1].id,
            );
        }
    }

    #[test]
    fn square_route() {
        let g = square_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.status(), SearchStatus::Initialized);
        assert_eq!(planner.start_node().id, 1);
        assert_eq!(planner.end_node().id, 3);

        assert_eq!(planner.run().unwrap(), SearchStatus::Found);
        assert_eq!(planner.status(), SearchStatus::Found);

        // Both [1, 2, 3] and [1, 4, 3] are shortest; the tie goes to the
        // earlier-admitted node 2.
        let ids = planner.path().iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_path_is_walkable(&g, planner.path());
        assert_almost_eq!(planner.distance(), 2.0);

        // The straight-line estimate never exceeds the road distance
        assert!(planner.start_node().distance(&planner.end_node()) <= planner.distance());
    }

    #[test]
    fn metric_scale_applied() {
        let mut g = square_graph();
        g.set_metric_scale(1250.0);

        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.run().unwrap(), SearchStatus::Found);
        assert_almost_eq!(planner.distance(), 2500.0);
    }

    #[test]
    fn start_equals_end() {
        let g = square_graph();
        let mut planner = RoutePlanner::new(&g, 10.0, 10.0, 10.0, 10.0).unwrap();
        assert_eq!(planner.start_node().id, planner.end_node().id);

        assert_eq!(planner.run().unwrap(), SearchStatus::Found);
        assert_eq!(planner.path().len(), 1);
        assert_eq!(planner.path()[0].id, 1);
        assert_eq!(planner.distance(), 0.0);
    }

    #[test]
    fn unreachable_end() {
        //  1───2    3 (isolated)
        let mut g = Graph::new();
        g.set_node(node(1, 0.0, 0.0));
        g.set_node(node(2, 0.1, 0.0));
        g.set_node(node(3, 1.0, 1.0));
        g.set_edge_bidirectional(1, 2);

        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.end_node().id, 3);

        assert_eq!(planner.run().unwrap(), SearchStatus::Exhausted);
        assert!(planner.path().is_empty());
        assert_eq!(planner.distance(), 0.0);

        // A finished session stays finished
        assert_eq!(planner.run().unwrap(), SearchStatus::Exhausted);
    }

    #[test]
    fn empty_graph() {
        let g = Graph::new();
        assert_eq!(
            RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap_err(),
            PlanError::EmptyGraph,
        );
    }

    #[test]
    fn grid_route() {
        let g = grid_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.start_node().id, 1);
        assert_eq!(planner.end_node().id, 9);

        assert_eq!(planner.run().unwrap(), SearchStatus::Found);
        assert_eq!(planner.path().first().unwrap().id, 1);
        assert_eq!(planner.path().last().unwrap().id, 9);
        assert_path_is_walkable(&g, planner.path());
        // 4 edges of length 0.5 each, no matter which staircase is taken
        assert_eq!(planner.path().len(), 5);
        assert_almost_eq!(planner.distance(), 2.0);
    }

    #[test]
    fn selection_is_monotonic() {
        let g = grid_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();

        let start = planner.start_node();
        let h = start.distance(&planner.end_node());
        planner.admit(start.id, NodeState {
            g: 0.0,
            h,
            parent: None,
        });

        let mut last_score = f32::NEG_INFINITY;
        while let Some(item) = planner.frontier.pop() {
            assert!(
                item.score >= last_score,
                "selection order regressed: {} after {}",
                item.score,
                last_score,
            );
            last_score = item.score;

            if item.node_id == planner.end_node().id {
                return;
            }
            planner.expand(item.node_id);
        }
        panic!("end node was never selected");
    }

    #[test]
    fn single_admission() {
        let g = grid_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.run().unwrap(), SearchStatus::Found);

        // Every admission bumps the sequence number, so more admissions
        // than nodes would mean some node entered the frontier twice.
        assert!(planner.next_seq as usize <= g.len());
        assert_eq!(planner.visited.len(), planner.next_seq as usize);
    }

    #[test]
    fn path_cost_matches_accumulated_g() {
        let g = grid_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(planner.run().unwrap(), SearchStatus::Found);

        let walked: f32 = planner
            .path()
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum();
        let end_state = planner.visited[&planner.end_node().id];
        assert_almost_eq!(walked, end_state.g);
    }

    #[test]
    fn step_limit_interrupts_and_resumes() {
        let g = grid_graph();
        let mut planner = RoutePlanner::new(&g, 0.0, 0.0, 100.0, 100.0)
            .unwrap()
            .with_step_limit(1);

        assert_eq!(planner.run().unwrap_err(), PlanError::StepLimitExceeded);
        assert_eq!(planner.status(), SearchStatus::Searching);

        // One expansion per call; the 3x3 grid must finish well within that
        let mut outcome = None;
        for _ in 0..20 {
            match planner.run() {
                Ok(status) => {
                    outcome = Some(status);
                    break;
                }
                Err(PlanError::StepLimitExceeded) => continue,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(outcome, Some(SearchStatus::Found));
        assert_almost_eq!(planner.distance(), 2.0);
    }
}
