// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! A* shortest-path planning over pre-built road-network graphs.
//!
//! The crate takes a [Graph] of nodes in normalized map coordinates,
//! resolves a pair of percentage-scale positions to their nearest nodes,
//! and runs a best-first A* search with a straight-line heuristic.
//! The resulting path and its real-world distance are exposed on the
//! [RoutePlanner] after a successful run.
//!
//! # Example
//!
//! ```no_run
//! let mut g = routeplan::Graph::new();
//! g.set_node(routeplan::Node { id: 1, x: 0.0, y: 0.0 });
//! g.set_node(routeplan::Node { id: 2, x: 0.5, y: 0.5 });
//! g.set_edge_bidirectional(1, 2);
//!
//! let mut planner = routeplan::RoutePlanner::new(&g, 10.0, 10.0, 60.0, 60.0)
//!     .expect("graph must not be empty");
//! match planner.run().expect("step limit not exceeded") {
//!     routeplan::SearchStatus::Found => {
//!         println!("Route: {:?}", planner.path());
//!         println!("Distance: {}", planner.distance());
//!     }
//!     _ => println!("No route exists"),
//! }
//! ```

mod astar;
mod distance;
mod graph;
mod kd;

pub use astar::{PlanError, RoutePlanner, SearchStatus, DEFAULT_STEP_LIMIT};
pub use distance::euclidean_distance;
pub use graph::Graph;
pub use kd::KDTree;

/// Represents an element of the [Graph].
///
/// Positions are expressed in the graph's internal normalized coordinate
/// system; multiply path distances by [Graph::metric_scale] to obtain
/// real-world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub x: f32,
    pub y: f32,
}

impl Node {
    /// Straight-line distance between this node's and another node's positions.
    ///
    /// This is both the edge metric and the A* heuristic, which keeps the
    /// heuristic admissible and consistent.
    pub fn distance(&self, other: &Node) -> f32 {
        euclidean_distance(self.x, self.y, other.x, other.y)
    }
}
