//! Incremental D* Lite replanning for an agent on a grid whose obstacles
//! appear while it moves.

pub mod agent;
pub mod algorithms;
pub mod config;
pub mod error;
pub mod grid;
pub mod simulation;
pub mod statistics;
pub mod vertex;

pub use algorithms::d_star_lite::{DStarLite, PlannerConfig, SearchReport, SearchStatus};
pub use error::{PlannerError, Result};
pub use grid::Position;
pub use vertex::{Cost, VertexStore, INFINITY};
