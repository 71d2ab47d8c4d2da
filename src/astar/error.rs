// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in
/// [RoutePlanner::run](crate::RoutePlanner::run) before
/// [PlanError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur when constructing or running a
/// [RoutePlanner](crate::RoutePlanner).
///
/// An exhausted search (no path exists) is not an error; it is reported as
/// [SearchStatus::Exhausted](crate::SearchStatus::Exhausted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The graph contains no nodes, so the start and end positions
    /// cannot be resolved.
    #[error("cannot resolve positions against an empty graph")]
    EmptyGraph,

    /// Route search has exceeded its limit of steps.
    /// Either the nodes are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing the whole graph,
    /// which can result in a denial-of-service. The step limit protects
    /// against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}
