//! Configuration for quadtree construction and refinement.

use crate::constants::{DEFAULT_BOUNDARY_EPSILON, DEFAULT_MAX_REFINE_ROUNDS};
use crate::errors::{QuadTreeError, QuadTreeResult};

/// Tunable parameters shared by every node of a [`QuadTree`](crate::QuadTree).
///
/// The defaults reject only split points lying on (or within one machine
/// epsilon of) a node's edge, and bound [`QuadTree::refine`](crate::QuadTree::refine)
/// to 64 rounds.
///
/// # Examples
///
/// ```rust
/// use quadtree::QuadTreeConfig;
///
/// let config = QuadTreeConfig::new()
///     .with_boundary_epsilon(1e-9)
///     .with_max_refine_rounds(8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuadTreeConfig {
    boundary_epsilon: f64,
    max_refine_rounds: usize,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadTreeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        QuadTreeConfig {
            boundary_epsilon: DEFAULT_BOUNDARY_EPSILON,
            max_refine_rounds: DEFAULT_MAX_REFINE_ROUNDS,
        }
    }

    /// Returns the split-point tolerance.
    pub fn boundary_epsilon(&self) -> f64 {
        self.boundary_epsilon
    }

    /// Sets the split-point tolerance. A split coordinate closer than this to
    /// a node edge is rejected as out of range.
    pub fn with_boundary_epsilon(mut self, epsilon: f64) -> Self {
        self.boundary_epsilon = epsilon;
        self
    }

    /// Returns the maximum number of rounds performed by `refine`.
    pub fn max_refine_rounds(&self) -> usize {
        self.max_refine_rounds
    }

    /// Sets the maximum number of rounds performed by `refine`.
    pub fn with_max_refine_rounds(mut self, rounds: usize) -> Self {
        self.max_refine_rounds = rounds;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the epsilon is negative or not finite, or if
    /// the refine bound is zero.
    pub fn validate(&self) -> QuadTreeResult<()> {
        if !self.boundary_epsilon.is_finite() || self.boundary_epsilon < 0.0 {
            log::error!(
                "Boundary epsilon must be finite and non-negative, got {}",
                self.boundary_epsilon
            );
            return Err(QuadTreeError::InvalidConfig(format!(
                "boundary epsilon must be finite and non-negative, got {}",
                self.boundary_epsilon
            )));
        }

        if self.max_refine_rounds == 0 {
            log::error!("Max refine rounds must be greater than zero");
            return Err(QuadTreeError::InvalidConfig(
                "max refine rounds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
