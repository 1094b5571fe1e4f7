//! Constants for the quadtree implementation.

/// Default tolerance for split-point validation. A split coordinate closer
/// than this to either edge of a node is treated as lying on the edge.
pub const DEFAULT_BOUNDARY_EPSILON: f64 = f64::EPSILON;

/// Default upper bound on untargeted split rounds performed by `refine`
pub const DEFAULT_MAX_REFINE_ROUNDS: usize = 64;

/// Number of children owned by every branch
pub const QUADRANT_COUNT: usize = 4;
