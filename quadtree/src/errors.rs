//! Error and result types for quadtree operations.

use crate::bounding_box::BoundingBox;
use crate::node::LeafId;
use std::fmt;
use thiserror::Error;

/// The axis (or axes) on which a split point was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Both,
}

impl Axis {
    /// Builds the axis descriptor from per-axis validity, `None` when both are valid.
    pub(crate) fn from_validity(x_valid: bool, y_valid: bool) -> Option<Axis> {
        match (x_valid, y_valid) {
            (true, true) => None,
            (false, true) => Some(Axis::X),
            (true, false) => Some(Axis::Y),
            (false, false) => Some(Axis::Both),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Both => write!(f, "x and y"),
        }
    }
}

/// Errors that can occur while building or splitting a quadtree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadTreeError {
    #[error("Cannot infer bounds from an empty content set")]
    EmptyContent,

    #[error("Split point ({x}, {y}) is out of range on the {axis} axis of {bounds}")]
    SplitPointOutOfRange {
        axis: Axis,
        x: f64,
        y: f64,
        bounds: BoundingBox,
    },

    #[error("Invalid bounds: {0}")]
    InvalidBounds(BoundingBox),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No leaf with id {0} in this tree")]
    LeafNotFound(LeafId),
}

impl QuadTreeError {
    /// Returns the rejected axis for out-of-range split points.
    pub fn axis(&self) -> Option<Axis> {
        match self {
            QuadTreeError::SplitPointOutOfRange { axis, .. } => Some(*axis),
            _ => None,
        }
    }
}

/// Result type for quadtree operations
pub type QuadTreeResult<T> = Result<T, QuadTreeError>;
