//! The strategy contract consumed by every quadtree node.
//!
//! A [`QuadTreePolicy`] tells the tree where each content item lives, how to
//! average content, how to combine child averages, and which leaves to split
//! at which point. The tree never calls anything else.

use crate::constants::QUADRANT_COUNT;
use crate::node::{Leaf, LeafId};
use std::marker::PhantomData;

/// Strategy supplying coordinate access, averaging and split decisions.
///
/// Implementations must be deterministic for a given tree state: the
/// aggregation laziness of branches relies on an average being recomputable
/// to the same value at any later read.
pub trait QuadTreePolicy {
    /// Item stored in leaves.
    type Content;

    /// Aggregate value cached per node. Equality is used to recognise the
    /// no-content sentinel.
    type Average: PartialEq;

    /// X coordinate of an item.
    fn content_x(&self, item: &Self::Content) -> f64;

    /// Y coordinate of an item.
    fn content_y(&self, item: &Self::Content) -> f64;

    /// Average over a non-empty content slice, in one call.
    fn average(&self, content: &[Self::Content]) -> Self::Average;

    /// Combines the four child averages of a branch, given in top-right,
    /// bottom-right, bottom-left, top-left order. Entries equal to
    /// [`no_content_average`](Self::no_content_average) must contribute nothing.
    fn aggregate_averages(&self, averages: [&Self::Average; QUADRANT_COUNT]) -> Self::Average;

    /// Sentinel average of a region without content.
    fn no_content_average(&self) -> Self::Average;

    /// Selects the leaves an untargeted split of a branch should split.
    fn nodes_to_split(&self, leaves: &[&Leaf<Self::Content, Self::Average>]) -> Vec<LeafId>;

    /// X coordinate at which `leaf` should be split. Defaults to its center.
    fn split_x(&self, leaf: &Leaf<Self::Content, Self::Average>) -> f64 {
        leaf.bounds().x_center()
    }

    /// Y coordinate at which `leaf` should be split. Defaults to its center.
    fn split_y(&self, leaf: &Leaf<Self::Content, Self::Average>) -> f64 {
        leaf.bounds().y_center()
    }

    /// Whether `average` is the no-content sentinel.
    fn is_no_content(&self, average: &Self::Average) -> bool {
        *average == self.no_content_average()
    }
}

/// An item with a position and a numeric value.
pub trait Located {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn value(&self) -> f64;
}

impl Located for (f64, f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }

    fn y(&self) -> f64 {
        self.1
    }

    fn value(&self) -> f64 {
        self.2
    }
}

/// Running mean kept as a sum and a count so that child means combine exactly.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Mean {
    pub sum: f64,
    pub count: usize,
}

impl Mean {
    /// Mean of nothing, the no-content sentinel of [`MeanValuePolicy`].
    pub const EMPTY: Mean = Mean { sum: 0.0, count: 0 };

    pub fn new(sum: f64, count: usize) -> Self {
        Mean { sum, count }
    }

    /// The mean value, `None` for an empty mean.
    pub fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn merge(self, other: &Mean) -> Mean {
        Mean {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }
}

/// Capacity-driven policy over [`Located`] items.
///
/// Averages item values, and on an untargeted split selects every leaf holding
/// more than `capacity` items whose sides are both wider than `min_extent`.
/// Leaves are split at their center.
#[derive(Debug, Clone)]
pub struct MeanValuePolicy<T> {
    capacity: usize,
    min_extent: f64,
    _marker: PhantomData<fn(&T)>,
}

impl<T> MeanValuePolicy<T> {
    /// Default smallest side length a leaf must exceed to be selected for splitting
    pub const DEFAULT_MIN_EXTENT: f64 = 1e-9;

    pub fn new(capacity: usize) -> Self {
        MeanValuePolicy {
            capacity,
            min_extent: Self::DEFAULT_MIN_EXTENT,
            _marker: PhantomData,
        }
    }

    /// Sets the side length at or below which leaves are never selected.
    pub fn with_min_extent(mut self, min_extent: f64) -> Self {
        self.min_extent = min_extent;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_extent(&self) -> f64 {
        self.min_extent
    }
}

impl<T: Located> QuadTreePolicy for MeanValuePolicy<T> {
    type Content = T;
    type Average = Mean;

    fn content_x(&self, item: &T) -> f64 {
        item.x()
    }

    fn content_y(&self, item: &T) -> f64 {
        item.y()
    }

    fn average(&self, content: &[T]) -> Mean {
        content
            .iter()
            .fold(Mean::EMPTY, |acc, item| acc.merge(&Mean::new(item.value(), 1)))
    }

    fn aggregate_averages(&self, averages: [&Mean; QUADRANT_COUNT]) -> Mean {
        averages
            .into_iter()
            .filter(|avg| !self.is_no_content(avg))
            .fold(Mean::EMPTY, |acc, avg| acc.merge(avg))
    }

    fn no_content_average(&self) -> Mean {
        Mean::EMPTY
    }

    fn nodes_to_split(&self, leaves: &[&Leaf<T, Mean>]) -> Vec<LeafId> {
        leaves
            .iter()
            .filter(|leaf| leaf.len() > self.capacity)
            .filter(|leaf| {
                let bounds = leaf.bounds();
                bounds.width() > self.min_extent && bounds.height() > self.min_extent
            })
            .map(|leaf| leaf.id())
            .collect()
    }
}
