// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{euclidean_distance, Node};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a road network as a set of [Nodes](Node) and
/// adjacency (neighbor) relations between them.
///
/// Edge costs are not stored; the cost of traversing an edge is always
/// the straight-line distance between the two nodes' positions. This keeps
/// the edge metric identical to the A* heuristic's metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<i64, (Node, Vec<i64>)>,
    metric_scale: f32,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph with a metric scale of 1.0.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            metric_scale: 1.0,
        }
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|(_, (node, _))| node)
    }

    /// Conversion factor from internal (normalized) distance units
    /// to real-world units, e.g. meters.
    pub fn metric_scale(&self) -> f32 {
        self.metric_scale
    }

    /// Sets the conversion factor from internal distance units to
    /// real-world units. Applied once, when a finished path's total
    /// distance is computed.
    pub fn set_metric_scale(&mut self, scale: f32) {
        self.metric_scale = scale;
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.nodes.get(&id).map(|&(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming adjacency relations are preserved.
    pub fn set_node(&mut self, node: Node) {
        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
    }

    /// Deletes a [Node] with a given `id`.
    ///
    /// While all outgoing adjacency entries are removed, incoming ones are
    /// preserved (as this would require a walk over all nodes in the graph).
    /// Dangling neighbor ids are silently skipped during route search.
    pub fn delete_node(&mut self, id: i64) {
        self.nodes.remove(&id);
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// Out-of-range positions are not an error; the nearest available node
    /// wins regardless of how far away it is. Returns [None] only when the
    /// graph has no nodes at all.
    ///
    /// This function requires computing the distance to every [Node] in the
    /// graph. For repeated lookups on large graphs, build a [KDTree](crate::KDTree).
    pub fn find_nearest_node(&self, x: f32, y: f32) -> Option<Node> {
        self.nodes
            .iter()
            .map(|(_, &(nd, _))| (euclidean_distance(x, y, nd.x, nd.y), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.partial_cmp(b_dist).unwrap())
            .map(|(_, nd)| nd)
    }

    /// Gets the ids of all neighbors of a node with a given id.
    ///
    /// Repeated calls return the same set; neighbor discovery is idempotent.
    pub fn neighbors(&self, id: i64) -> &[i64] {
        self.nodes
            .get(&id)
            .map(|(_, n)| n.as_slice())
            .unwrap_or_default()
    }

    /// Records `to` as a neighbor of `from` (a directed adjacency).
    ///
    /// Inserting an already-present neighbor is a no-op, so repeated
    /// discovery of the same edge never duplicates it.
    pub fn set_edge(&mut self, from: i64, to: i64) {
        if let Some((_, neighbors)) = self.nodes.get_mut(&from) {
            if !neighbors.contains(&to) {
                neighbors.push(to);
            }
        }
    }

    /// Records `a` and `b` as neighbors of each other.
    ///
    /// Road segments are traversable in both directions, so this is the
    /// usual way to add them.
    pub fn set_edge_bidirectional(&mut self, a: i64, b: i64) {
        self.set_edge(a, b);
        self.set_edge(b, a);
    }

    /// Removes the adjacency from one node to another.
    pub fn delete_edge(&mut self, from: i64, to: i64) {
        if let Some((_, neighbors)) = self.nodes.get_mut(&from) {
            if let Some(idx) = neighbors.iter().position(|&n| n == to) {
                neighbors.swap_remove(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, x: f32, y: f32) -> Node {
        Node { id, x, y }
    }

    fn simple_graph() -> Graph {
        //  4───3
        //  │   │
        //  1───2
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

    #[test]
    fn nearest_node() {
        let g = simple_graph();
        assert_eq!(g.find_nearest_node(0.1, 0.2).unwrap().id, 1);
        assert_eq!(g.find_nearest_node(0.9, 0.8).unwrap().id, 3);

        // Out-of-range positions degrade to the nearest available node
        assert_eq!(g.find_nearest_node(-50.0, -50.0).unwrap().id, 1);
        assert_eq!(g.find_nearest_node(100.0, 0.0).unwrap().id, 2);

        assert_eq!(Graph::new().find_nearest_node(0.0, 0.0), None);
    }

    #[test]
    fn idempotent_edge_insertion() {
        let mut g = simple_graph();
        assert_eq!(g.neighbors(1), &[2, 4]);

        g.set_edge(1, 2);
        g.set_edge_bidirectional(1, 2);
        assert_eq!(g.neighbors(1), &[2, 4]);
        assert_eq!(g.neighbors(2), &[1, 3]);
    }

    #[test]
    fn edge_deletion() {
        let mut g = simple_graph();
        g.delete_edge(1, 2);
        assert_eq!(g.neighbors(1), &[4]);
        // The reverse direction is unaffected
        assert_eq!(g.neighbors(2), &[1, 3]);
    }

    #[test]
    fn dangling_neighbors_after_node_deletion() {
        let mut g = simple_graph();
        g.delete_node(2);
        assert_eq!(g.get_node(2), None);
        assert_eq!(g.neighbors(2), &[] as &[i64]);
        // Incoming adjacency entries remain and must be skipped by consumers
        assert!(g.neighbors(1).contains(&2));
    }
}
