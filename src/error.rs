//! Error types for the replanner

use crate::grid::Position;
use thiserror::Error;

/// Planner error type
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("position ({}, {}) is outside the {width}x{height} grid", position.x, position.y)]
    InvalidCoordinate {
        position: Position,
        width: usize,
        height: usize,
    },

    #[error("no path to the goal from ({}, {})", from.x, from.y)]
    NoPathFound { from: Position },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
