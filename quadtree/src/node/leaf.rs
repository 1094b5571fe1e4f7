use super::{Branch, LeafId, Node};
use crate::bounding_box::{BoundingBox, Quadrant};
use crate::constants::QUADRANT_COUNT;
use crate::errors::QuadTreeResult;
use crate::policy::QuadTreePolicy;
use std::cell::OnceCell;

/// A node holding content directly.
///
/// Every item of a leaf lies inside its bounds. Content order is the order the
/// items were given in, duplicates included.
#[derive(Debug)]
pub struct Leaf<C, A> {
    id: LeafId,
    bounds: BoundingBox,
    content: Vec<C>,
    average: OnceCell<A>,
}

impl<C, A> Leaf<C, A> {
    /// Creates a leaf over `bounds`, keeping only the candidates inside it.
    ///
    /// # Errors
    ///
    /// `InvalidBounds` if `bounds` has NaN or inverted edges.
    pub fn with_bounds<P, I>(policy: &P, bounds: BoundingBox, candidates: I) -> QuadTreeResult<Self>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
        I: IntoIterator<Item = C>,
    {
        let bounds = bounds.validated()?;
        let content = candidates
            .into_iter()
            .filter(|item| bounds.contains_point(policy.content_x(item), policy.content_y(item)))
            .collect();
        Ok(Leaf::from_parts(bounds, content))
    }

    /// Creates a leaf over the smallest region covering all items.
    ///
    /// # Errors
    ///
    /// `EmptyContent` if there are no items, `InvalidBounds` if an item has a
    /// NaN coordinate.
    pub fn from_content<P, I>(policy: &P, items: I) -> QuadTreeResult<Self>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
        I: IntoIterator<Item = C>,
    {
        let content: Vec<C> = items.into_iter().collect();
        let bounds = BoundingBox::covering(
            content
                .iter()
                .map(|item| (policy.content_x(item), policy.content_y(item))),
        )?;
        Ok(Leaf::from_parts(bounds, content))
    }

    pub(crate) fn from_parts(bounds: BoundingBox, content: Vec<C>) -> Self {
        Leaf {
            id: LeafId::next(),
            bounds,
            content,
            average: OnceCell::new(),
        }
    }

    pub fn id(&self) -> LeafId {
        self.id
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn content(&self) -> &[C] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounds.contains_point(x, y)
    }

    pub fn contains_item<P>(&self, policy: &P, item: &C) -> bool
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        self.contains_point(policy.content_x(item), policy.content_y(item))
    }

    /// Average of the content, or the no-content sentinel for an empty leaf.
    pub fn average<P>(&self, policy: &P) -> &A
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        self.average.get_or_init(|| {
            log::trace!("Computing average of {} over {} items", self.id, self.content.len());
            if self.content.is_empty() {
                policy.no_content_average()
            } else {
                policy.average(&self.content)
            }
        })
    }

    pub fn is_average_current(&self) -> bool {
        self.average.get().is_some()
    }

    /// Moves the content into four new leaves around `(x, y)` and returns the
    /// branch owning them. The split point must already be validated; this
    /// leaf is left empty and is meant to be dropped.
    pub(crate) fn split_into_branch<P>(&mut self, policy: &P, x: f64, y: f64) -> Branch<C, A>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        let quadrants = self.bounds.quadrants(x, y);
        let mut parts: [Vec<C>; QUADRANT_COUNT] = Default::default();

        for item in std::mem::take(&mut self.content) {
            let (ix, iy) = (policy.content_x(&item), policy.content_y(&item));
            let index = Quadrant::around((x, y), ix, iy).index();
            debug_assert!(
                quadrants[index].contains_point(ix, iy),
                "item at ({}, {}) is outside {}",
                ix,
                iy,
                self.bounds
            );
            parts[index].push(item);
        }

        log::debug!(
            "Split {} {} at ({}, {}) into {}/{}/{}/{} items",
            self.id,
            self.bounds,
            x,
            y,
            parts[0].len(),
            parts[1].len(),
            parts[2].len(),
            parts[3].len()
        );

        let [tr, br, bl, tl] = parts;
        let [tr_bounds, br_bounds, bl_bounds, tl_bounds] = quadrants;
        Branch::from_children([
            Box::new(Node::Leaf(Leaf::from_parts(tr_bounds, tr))),
            Box::new(Node::Leaf(Leaf::from_parts(br_bounds, br))),
            Box::new(Node::Leaf(Leaf::from_parts(bl_bounds, bl))),
            Box::new(Node::Leaf(Leaf::from_parts(tl_bounds, tl))),
        ])
    }
}
