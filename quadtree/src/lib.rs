//! # Quadtree - Adaptive Spatial Partitioning with Region Averages
//!
//! This crate provides a quadtree over a rectangular 2D region. Content items
//! are located by `(x, y)` coordinates and every region caches an aggregate
//! "average" over the content below it.
//!
//! ## Features
//!
//! - **On-Demand Subdivision**: A leaf splits into four quadrants at its center
//!   or at any interior point chosen by the caller
//! - **Policy Driven**: Coordinates, averaging and split decisions come from a
//!   caller-supplied [`QuadTreePolicy`]
//! - **Half-Open Regions**: Minimum edges are inclusive and maximum edges are
//!   exclusive, so every point belongs to exactly one leaf
//! - **Lazy Aggregation**: Splits only invalidate cached averages on the path
//!   to the root; recomputation waits for the next read
//! - **Targeted Splits**: Leaves are addressed by [`LeafId`], and a targeted
//!   split only touches the subtree holding that leaf
//!
//! ## Quick Start
//!
//! ```rust
//! use quadtree::{BoundingBox, Mean, MeanValuePolicy, QuadTree};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = MeanValuePolicy::<(f64, f64, f64)>::new(1);
//! let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
//! let mut tree = QuadTree::with_bounds(policy, bounds, vec![(1.0, 1.0, 2.0), (8.0, 8.0, 16.0)])?;
//!
//! tree.split_at(5.0, 5.0)?;
//! assert_eq!(tree.leaf_count(), 4);
//! assert_eq!(*tree.average(), Mean::new(18.0, 2));
//!
//! // a point on the maximum edge is outside the region
//! assert!(tree.split_at(10.0, 5.0).is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Trees are single-threaded. Nodes cache averages through interior
//! mutability and are not `Sync`; callers must serialize access themselves.

pub mod bounding_box;
pub mod config;
pub mod constants;
pub mod errors;
pub mod node;
pub mod policy;
pub mod quadtree;

pub use bounding_box::{BoundingBox, Quadrant};
pub use config::QuadTreeConfig;
pub use errors::{Axis, QuadTreeError, QuadTreeResult};
pub use node::{Branch, Leaf, LeafId, Node};
pub use policy::{Located, Mean, MeanValuePolicy, QuadTreePolicy};
pub use quadtree::QuadTree;
