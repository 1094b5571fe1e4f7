//! Node hierarchy of the quadtree.
//!
//! A [`Node`] is either a [`Leaf`] holding content directly or a [`Branch`]
//! owning exactly four children. A leaf turns into a branch, irreversibly, when
//! it is split; the parent's slot is overwritten with the new branch.
//!
//! Averages are cached per node and invalidated along the path to the root
//! whenever a split changes the structure below. Recomputation is deferred to
//! the next read.

mod branch;
mod leaf;

pub use branch::Branch;
pub use leaf::Leaf;

use crate::bounding_box::BoundingBox;
use crate::config::QuadTreeConfig;
use crate::errors::QuadTreeResult;
use crate::policy::QuadTreePolicy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LEAF_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a leaf, unique within the process.
///
/// Every leaf receives a fresh id when it is created, including the four
/// leaves produced by a split, so an id never refers to a leaf that has been
/// replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u64);

impl LeafId {
    pub(crate) fn next() -> LeafId {
        LeafId(NEXT_LEAF_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf#{}", self.0)
    }
}

/// A region of the quadtree.
///
/// Not safe for concurrent mutation: the average cache uses interior
/// mutability, so a node is `!Sync`.
#[derive(Debug)]
pub enum Node<C, A> {
    Leaf(Leaf<C, A>),
    Branch(Branch<C, A>),
}

impl<C, A> From<Leaf<C, A>> for Node<C, A> {
    fn from(leaf: Leaf<C, A>) -> Self {
        Node::Leaf(leaf)
    }
}

impl<C, A> Node<C, A> {
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Node::Leaf(leaf) => leaf.bounds(),
            Node::Branch(branch) => branch.bounds(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf<C, A>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Branch<C, A>> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(branch) => Some(branch),
        }
    }

    /// Checks if the point is inside this node (min inclusive, max exclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounds().contains_point(x, y)
    }

    /// Checks if the item's coordinates are inside this node.
    pub fn contains_item<P>(&self, policy: &P, item: &C) -> bool
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        self.contains_point(policy.content_x(item), policy.content_y(item))
    }

    /// Checks that every item is inside this node. True for no items.
    pub fn contains_all_items<'a, P, I>(&self, policy: &P, items: I) -> bool
    where
        P: QuadTreePolicy<Content = C, Average = A>,
        I: IntoIterator<Item = &'a C>,
        C: 'a,
    {
        self.bounds().contains_all(
            items
                .into_iter()
                .map(|item| (policy.content_x(item), policy.content_y(item))),
        )
    }

    /// All content below this node, depth first in top-right, bottom-right,
    /// bottom-left, top-left order. Calling again restarts the enumeration.
    pub fn content(&self) -> Content<'_, C, A> {
        Content {
            leaves: self.leaves(),
            current: <&[C]>::default().iter(),
        }
    }

    /// All leaves below this node (or the node itself if it is a leaf), in the
    /// same order as [`content`](Self::content).
    pub fn leaves(&self) -> Leaves<'_, C, A> {
        Leaves { stack: vec![self] }
    }

    /// Number of content items below this node.
    pub fn len(&self) -> usize {
        self.leaves().map(Leaf::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves().all(Leaf::is_empty)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Number of levels, 1 for a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(branch) => {
                1 + branch
                    .children()
                    .iter()
                    .map(|child| child.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// The unique leaf whose region contains the point.
    pub fn find_leaf(&self, x: f64, y: f64) -> Option<&Leaf<C, A>> {
        if !self.contains_point(x, y) {
            return None;
        }
        let mut node = self;
        loop {
            match node {
                Node::Leaf(leaf) => return Some(leaf),
                Node::Branch(branch) => node = branch.child_containing(x, y)?,
            }
        }
    }

    /// Looks a leaf up by identity.
    pub fn leaf(&self, id: LeafId) -> Option<&Leaf<C, A>> {
        self.leaves().find(|leaf| leaf.id() == id)
    }

    pub fn contains_leaf(&self, id: LeafId) -> bool {
        self.leaf(id).is_some()
    }

    /// The cached average, recomputed first if a split invalidated it.
    pub fn average<P>(&self, policy: &P) -> &A
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        match self {
            Node::Leaf(leaf) => leaf.average(policy),
            Node::Branch(branch) => branch.average(policy),
        }
    }

    /// Whether the cached average is current.
    pub fn is_average_current(&self) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.is_average_current(),
            Node::Branch(branch) => branch.is_average_current(),
        }
    }

    /// Splits according to the policy.
    ///
    /// A leaf is split at the point the policy picks for it. A branch asks the
    /// policy which of its leaves to split, then splits each of them in turn.
    /// Returns the number of leaves split.
    ///
    /// # Errors
    ///
    /// `SplitPointOutOfRange` if the policy picks a point on or outside a
    /// leaf's edge. Every point is checked before anything is split, so the
    /// tree is unchanged on error.
    pub fn split<P>(&mut self, policy: &P, config: &QuadTreeConfig) -> QuadTreeResult<usize>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        match self {
            Node::Leaf(leaf) => {
                let x = policy.split_x(leaf);
                let y = policy.split_y(leaf);
                self.split_at(policy, config, x, y)?;
                Ok(1)
            }
            Node::Branch(_) => self.split_selected(policy, config),
        }
    }

    /// Splits the leaves selected by `nodes_to_split`, for leaves and branches alike.
    pub(crate) fn split_selected<P>(
        &mut self,
        policy: &P,
        config: &QuadTreeConfig,
    ) -> QuadTreeResult<usize>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        let plan = {
            let leaves: Vec<&Leaf<C, A>> = self.leaves().collect();
            let selected = policy.nodes_to_split(&leaves);

            let mut plan = Vec::with_capacity(selected.len());
            for id in selected {
                let Some(leaf) = leaves.iter().find(|leaf| leaf.id() == id) else {
                    log::warn!("Policy selected {} which is not in this tree, skipping", id);
                    continue;
                };
                let x = policy.split_x(leaf);
                let y = policy.split_y(leaf);
                leaf.bounds()
                    .validate_split_point(x, y, config.boundary_epsilon())?;
                plan.push((id, x, y));
            }
            plan
        };

        let mut split_count = 0;
        for (id, x, y) in plan {
            if self.split_leaf(policy, config, Some(id), x, y)? {
                split_count += 1;
            }
        }
        Ok(split_count)
    }

    /// Splits the leaf containing `(x, y)` at exactly that point.
    ///
    /// # Errors
    ///
    /// `SplitPointOutOfRange` if the point is on or outside the edge of this
    /// node or of the leaf containing it. The node is unchanged on error.
    pub fn split_at<P>(
        &mut self,
        policy: &P,
        config: &QuadTreeConfig,
        x: f64,
        y: f64,
    ) -> QuadTreeResult<()>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        match self {
            Node::Leaf(leaf) => {
                leaf.bounds()
                    .validate_split_point(x, y, config.boundary_epsilon())?;
                let branch = leaf.split_into_branch(policy, x, y);
                *self = Node::Branch(branch);
                Ok(())
            }
            Node::Branch(branch) => branch.split_at(policy, config, x, y),
        }
    }

    /// Splits the leaf identified by `target` at `(x, y)`.
    ///
    /// Returns `Ok(false)` without touching anything when `target` is `None`
    /// or not below this node. Only the subtree holding the target changes.
    ///
    /// # Errors
    ///
    /// `SplitPointOutOfRange` if the point is on or outside the target's edge.
    pub fn split_leaf<P>(
        &mut self,
        policy: &P,
        config: &QuadTreeConfig,
        target: Option<LeafId>,
        x: f64,
        y: f64,
    ) -> QuadTreeResult<bool>
    where
        P: QuadTreePolicy<Content = C, Average = A>,
    {
        let Some(id) = target else {
            return Ok(false);
        };
        match self {
            Node::Branch(branch) => branch.split_leaf(policy, config, id, x, y),
            Node::Leaf(leaf) => {
                if leaf.id() != id {
                    return Ok(false);
                }
                self.split_at(policy, config, x, y)?;
                Ok(true)
            }
        }
    }
}

/// Lazy depth-first iterator over the leaves below a node.
pub struct Leaves<'a, C, A> {
    stack: Vec<&'a Node<C, A>>,
}

impl<'a, C, A> Iterator for Leaves<'a, C, A> {
    type Item = &'a Leaf<C, A>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(leaf) => return Some(leaf),
                Node::Branch(branch) => {
                    // reversed so the top-right child is visited first
                    self.stack
                        .extend(branch.children().iter().rev().map(|child| &**child));
                }
            }
        }
        None
    }
}

/// Lazy iterator over the content below a node.
pub struct Content<'a, C, A> {
    leaves: Leaves<'a, C, A>,
    current: std::slice::Iter<'a, C>,
}

impl<'a, C, A> Iterator for Content<'a, C, A> {
    type Item = &'a C;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(item);
            }
            self.current = self.leaves.next()?.content().iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Axis, QuadTreeError};
    use crate::policy::{Mean, MeanValuePolicy};

    type Item = (f64, f64, f64);

    // Setup only one time for the unit test binary.
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn policy() -> MeanValuePolicy<Item> {
        MeanValuePolicy::new(1)
    }

    fn root(items: Vec<Item>) -> Node<Item, Mean> {
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        Node::from(Leaf::with_bounds(&policy(), bounds, items).unwrap())
    }

    fn ids(node: &Node<Item, Mean>) -> Vec<LeafId> {
        node.leaves().map(|leaf| leaf.id()).collect()
    }

    #[test]
    fn test_leaf_ids_are_unique() {
        let a = LeafId::next();
        let b = LeafId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
        assert!(a.to_string().starts_with("leaf#"));
    }

    #[test]
    fn test_leaf_node_basics() {
        let node = root(vec![(1.0, 1.0, 2.0), (8.0, 8.0, 16.0)]);
        assert!(node.is_leaf());
        assert!(node.as_branch().is_none());
        assert_eq!(node.len(), 2);
        assert_eq!(node.leaf_count(), 1);
        assert_eq!(node.depth(), 1);
        assert!(node.contains_point(0.0, 0.0));
        assert!(!node.contains_point(10.0, 0.0));
        assert!(node.contains_item(&policy(), &(9.5, 9.5, 0.0)));
        assert!(!node.contains_item(&policy(), &(9.5, 10.0, 0.0)));
    }

    #[test]
    fn test_split_at_scenario() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 2.0), (8.0, 8.0, 16.0)]);

        node.split_at(&policy, &config, 5.0, 5.0).unwrap();

        let branch = node.as_branch().expect("leaf should have become a branch");
        let tr = branch.top_right().as_leaf().unwrap();
        let br = branch.bottom_right().as_leaf().unwrap();
        let bl = branch.bottom_left().as_leaf().unwrap();
        let tl = branch.top_left().as_leaf().unwrap();

        assert_eq!(tr.bounds(), BoundingBox::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(tr.content(), &[(8.0, 8.0, 16.0)]);
        assert_eq!(bl.bounds(), BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(bl.content(), &[(1.0, 1.0, 2.0)]);
        assert!(br.is_empty());
        assert!(tl.is_empty());
        assert_eq!(*br.average(&policy), Mean::EMPTY);
        assert_eq!(*tl.average(&policy), Mean::EMPTY);

        assert_eq!(*node.average(&policy), Mean::new(18.0, 2));
        assert_eq!(node.average(&policy).value(), Some(9.0));
    }

    #[test]
    fn test_split_at_max_x_is_rejected() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 2.0), (8.0, 8.0, 16.0)]);
        let before = ids(&node);

        let err = node.split_at(&policy, &config, 10.0, 5.0).unwrap_err();
        assert_eq!(err.axis(), Some(Axis::X));
        assert!(node.is_leaf());
        assert_eq!(ids(&node), before);
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn test_split_at_min_edges_rejected_on_both_axes() {
        let mut node = root(vec![]);
        let err = node
            .split_at(&policy(), &QuadTreeConfig::new(), 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(
            err,
            QuadTreeError::SplitPointOutOfRange {
                axis: Axis::Both,
                ..
            }
        ));
    }

    #[test]
    fn test_content_order_is_depth_first() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![
            (1.0, 1.0, 0.0), // bottom left
            (1.0, 8.0, 0.0), // top left
            (8.0, 1.0, 0.0), // bottom right
            (8.0, 8.0, 0.0), // top right
            (9.0, 9.0, 0.0), // top right
        ]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();

        let order: Vec<(f64, f64)> = node.content().map(|c| (c.0, c.1)).collect();
        assert_eq!(
            order,
            vec![(8.0, 8.0), (9.0, 9.0), (8.0, 1.0), (1.0, 1.0), (1.0, 8.0)]
        );
        // restartable
        assert_eq!(node.content().count(), 5);
        assert_eq!(node.content().count(), 5);
    }

    #[test]
    fn test_nested_split_leaf_order() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();
        // splits the top-right quadrant
        node.split_at(&policy, &config, 7.5, 7.5).unwrap();

        assert_eq!(node.leaf_count(), 7);
        assert_eq!(node.depth(), 3);
        let bounds: Vec<BoundingBox> = node.leaves().map(|l| l.bounds()).collect();
        assert_eq!(bounds[0], BoundingBox::new(7.5, 7.5, 10.0, 10.0));
        assert_eq!(bounds[3], BoundingBox::new(5.0, 7.5, 7.5, 10.0));
        assert_eq!(bounds[4], BoundingBox::new(5.0, 0.0, 10.0, 5.0));
        assert_eq!(bounds[6], BoundingBox::new(0.0, 5.0, 5.0, 10.0));
    }

    #[test]
    fn test_split_at_outside_branch_is_rejected() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 1.0)]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();
        let before = ids(&node);

        assert!(node.split_at(&policy, &config, 12.0, 3.0).is_err());
        // on the internal edge between bottom-left and bottom-right
        let err = node.split_at(&policy, &config, 5.0, 3.0).unwrap_err();
        assert_eq!(err.axis(), Some(Axis::X));
        assert_eq!(ids(&node), before);
    }

    #[test]
    fn test_split_leaf_by_identity() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 1.0), (8.0, 8.0, 1.0)]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();

        let target = node.find_leaf(1.0, 1.0).unwrap().id();
        let siblings: Vec<LeafId> = ids(&node).into_iter().filter(|id| *id != target).collect();

        assert!(node.split_leaf(&policy, &config, Some(target), 2.5, 2.5).unwrap());
        assert!(!node.contains_leaf(target));
        for id in &siblings {
            assert!(node.contains_leaf(*id));
        }
        assert_eq!(node.leaf_count(), 7);

        // stale id is a no-op
        assert!(!node.split_leaf(&policy, &config, Some(target), 2.5, 2.5).unwrap());
        assert!(!node.split_leaf(&policy, &config, None, 2.5, 2.5).unwrap());
        assert_eq!(node.leaf_count(), 7);
    }

    #[test]
    fn test_split_leaf_rejects_point_outside_target() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();
        let target = node.find_leaf(1.0, 1.0).unwrap().id();
        let before = ids(&node);

        let err = node
            .split_leaf(&policy, &config, Some(target), 7.0, 2.0)
            .unwrap_err();
        assert_eq!(err.axis(), Some(Axis::X));
        assert_eq!(ids(&node), before);
    }

    #[test]
    fn test_split_on_leaf_uses_policy_point() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![]);
        assert_eq!(node.split(&policy, &config).unwrap(), 1);
        let branch = node.as_branch().unwrap();
        assert_eq!(branch.split_point(), (5.0, 5.0));
    }

    #[test]
    fn test_split_on_branch_uses_selection() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 1.0), (4.0, 4.0, 1.0), (8.0, 8.0, 1.0)]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();

        // only the bottom-left leaf is over capacity
        assert_eq!(node.split(&policy, &config).unwrap(), 1);
        assert_eq!(node.leaf_count(), 7);
        assert_eq!(node.find_leaf(1.0, 1.0).unwrap().content(), &[(1.0, 1.0, 1.0)]);
        assert_eq!(node.find_leaf(4.0, 4.0).unwrap().content(), &[(4.0, 4.0, 1.0)]);

        // nothing is over capacity any more
        assert_eq!(node.split(&policy, &config).unwrap(), 0);
    }

    #[test]
    fn test_average_invalidated_along_path() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![(1.0, 1.0, 4.0), (2.0, 2.0, 2.0), (8.0, 8.0, 6.0)]);
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();

        assert!(!node.is_average_current());
        assert_eq!(*node.average(&policy), Mean::new(12.0, 3));
        assert!(node.is_average_current());

        node.split_at(&policy, &config, 1.5, 1.5).unwrap();
        assert!(!node.is_average_current());
        let bottom_left = node.as_branch().unwrap().bottom_left();
        assert!(!bottom_left.is_average_current());
        // the untouched sibling keeps its cache
        assert!(node.as_branch().unwrap().top_right().is_average_current());

        assert_eq!(*node.average(&policy), Mean::new(12.0, 3));
    }

    #[test]
    fn test_find_leaf() {
        let policy = policy();
        let config = QuadTreeConfig::new();
        let mut node = root(vec![]);
        assert!(node.find_leaf(10.0, 1.0).is_none());
        node.split_at(&policy, &config, 5.0, 5.0).unwrap();
        let leaf = node.find_leaf(5.0, 5.0).unwrap();
        assert_eq!(leaf.bounds(), BoundingBox::new(5.0, 5.0, 10.0, 10.0));
        assert!(node.leaf(leaf.id()).is_some());
    }

    #[test]
    fn test_contains_all_items() {
        let node = root(vec![]);
        let policy = policy();
        let inside = vec![(1.0, 1.0, 0.0), (9.0, 9.0, 0.0)];
        let one_outside = vec![(1.0, 1.0, 0.0), (9.0, 10.0, 0.0)];

        assert!(node.contains_all_items(&policy, &inside));
        assert!(!node.contains_all_items(&policy, &one_outside));
        assert!(node.contains_all_items(&policy, &Vec::<Item>::new()));
    }
}
