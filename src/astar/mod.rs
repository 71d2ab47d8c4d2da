// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod planner;

pub use error::{PlanError, DEFAULT_STEP_LIMIT};
pub use planner::{RoutePlanner, SearchStatus};
