use super::{LeafId, Node};
use crate::bounding_box::{BoundingBox, Quadrant};
use crate::config::QuadTreeConfig;
use crate::constants::QUADRANT_COUNT;
use crate::errors::QuadTreeResult;
use crate::policy::QuadTreePolicy;
use std::cell::OnceCell;

/// A node owning exactly four children and no content of its own.
///
/// Children are stored in top-right, bottom-right, bottom-left, top-left
/// order. Their regions partition the branch's region around a single split
/// point. Branch bounds are fixed at construction: children only ever split
/// within their own bounds.
#[derive(Debug)]
pub struct Branch<C, A> {
    bounds: BoundingBox,
    split_point: (f64, f64),
    children: [Box<Node<C, A>>; QUADRANT_COUNT],
    average: OnceCell<A>,
}

impl<C, A> Branch<C, A> {
    pub(crate) fn from_children(children: [Box<Node<C, A>>; QUADRANT_COUNT]) -> Self {
        let bounds = children
            .iter()
            .skip(1)
            .fold(children[0].bounds(), |acc, child| acc.union(&child.bounds()));
        let top_right = children[Quadrant::TopRight.index()].bounds();

        Branch {
            bounds,
            split_point: (top_right.min_x, top_right.min_y),
            children,
            average: OnceCell::new(),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// The point the four children meet at.
    pub fn split_point(&self) -> (f64, f64) {
        self.split_point
    }

    /// Children in top-right, bottom-right, bottom-left, top-left order.
    pub fn children(&self) -> &[Box<Node<C, A>>; QUADRANT_COUNT] {
        &self.children
    }

    pub fn child(&self, quadrant: Quadrant) -> &Node<C, A> {
        &self.children[quadrant.index()]
    }

    pub fn top_right(&self) -> &Node<C, A> {
        self.child(Quadrant::TopRight)
    }

    pub fn bottom_right(&self) -> &Node<C, A> {
        self.child(Quadrant::BottomRight)
    }

    pub fn bottom_left(&self) -> &Node<C, A> {
        self.child(Quadrant::BottomLeft)
    }

    pub fn top_left(&self) -> &Node<C, A> {
        self.child(Quadrant::TopLeft)
    }

    pub(crate) fn child_containing(&self, x: f64, y: f64) -> Option<&Node<C, A>> {
        self.children
            .iter()
            .find(|child| child.contains_point(x, y))
            .map(|child| &**child)
    }

    /// Aggregate of the children's averages.
    pub fn average<P>(&self, policy: &P) -> &A
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        self.average.get_or_init(|| {
            log::trace!("Aggregating child averages of branch {}", self.bounds);
            let [tr, br, bl, tl] = &self.children;
            policy.aggregate_averages([
                tr.average(policy),
                br.average(policy),
                bl.average(policy),
                tl.average(policy),
            ])
        })
    }

    pub fn is_average_current(&self) -> bool {
        self.average.get().is_some()
    }

    pub(crate) fn invalidate_average(&mut self) {
        self.average.take();
    }

    pub(crate) fn split_at<P>(
        &mut self,
        policy: &P,
        config: &QuadTreeConfig,
        x: f64,
        y: f64,
    ) -> QuadTreeResult<()>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        self.bounds
            .validate_split_point(x, y, config.boundary_epsilon())?;

        for child in self.children.iter_mut() {
            if child.contains_point(x, y) {
                child.split_at(policy, config, x, y)?;
            }
        }
        self.invalidate_average();
        Ok(())
    }

    pub(crate) fn split_leaf<P>(
        &mut self,
        policy: &P,
        config: &QuadTreeConfig,
        id: LeafId,
        x: f64,
        y: f64,
    ) -> QuadTreeResult<bool>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        for child in self.children.iter_mut() {
            if child.split_leaf(policy, config, Some(id), x, y)? {
                self.invalidate_average();
                return Ok(true);
            }
        }
        Ok(false)
    }
}
