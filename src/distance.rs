// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Calculates the straight-line distance between two positions
/// in the graph's normalized planar coordinate system.
///
/// Edge costs and the A* heuristic both use this metric, so the
/// heuristic never overestimates the remaining road distance.
pub fn euclidean_distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}
