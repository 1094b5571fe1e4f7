//! Root holder of a quadtree.

use crate::bounding_box::BoundingBox;
use crate::config::QuadTreeConfig;
use crate::errors::{QuadTreeError, QuadTreeResult};
use crate::node::{Content, Leaf, LeafId, Leaves, Node};
use crate::policy::QuadTreePolicy;
use std::fmt;

type PolicyNode<P> = Node<<P as QuadTreePolicy>::Content, <P as QuadTreePolicy>::Average>;
type PolicyLeaf<P> = Leaf<<P as QuadTreePolicy>::Content, <P as QuadTreePolicy>::Average>;

/// A quadtree together with the policy and configuration it was built with.
///
/// The tree owns its root slot, so splitting the root leaf replaces it with a
/// branch in place. Nothing here is synchronized; callers sharing a tree
/// across threads must wrap it in their own lock.
///
/// # Examples
///
/// ```rust
/// use quadtree::{MeanValuePolicy, QuadTree};
///
/// let items = vec![(1.0, 1.0, 2.0), (8.0, 8.0, 16.0), (8.5, 8.5, 4.0)];
/// let policy = MeanValuePolicy::<(f64, f64, f64)>::new(1);
/// let mut tree = QuadTree::new(policy, items)?;
///
/// tree.refine()?;
/// assert_eq!(tree.len(), 3);
/// assert!(tree.leaves().all(|leaf| leaf.len() <= 1));
/// assert_eq!(tree.average().value(), Some(22.0 / 3.0));
/// # Ok::<(), quadtree::QuadTreeError>(())
/// ```
pub struct QuadTree<P: QuadTreePolicy> {
    policy: P,
    config: QuadTreeConfig,
    root: PolicyNode<P>,
}

impl<P> fmt::Debug for QuadTree<P>
where
    P: QuadTreePolicy + fmt::Debug,
    P::Content: fmt::Debug,
    P::Average: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .field("root", &self.root)
            .finish()
    }
}

impl<P: QuadTreePolicy> QuadTree<P> {
    /// Creates a tree whose root covers all items.
    ///
    /// # Errors
    ///
    /// `EmptyContent` if there are no items to infer the bounds from.
    pub fn new<I>(policy: P, items: I) -> QuadTreeResult<Self>
    where
        I: IntoIterator<Item = P::Content>,
    {
        let root = Leaf::from_content(&policy, items)?;
        Ok(QuadTree::from_root(policy, root))
    }

    /// Creates a tree over `bounds`, keeping only the items inside it.
    pub fn with_bounds<I>(policy: P, bounds: BoundingBox, items: I) -> QuadTreeResult<Self>
    where
        I: IntoIterator<Item = P::Content>,
    {
        let root = Leaf::with_bounds(&policy, bounds, items)?;
        Ok(QuadTree::from_root(policy, root))
    }

    fn from_root(policy: P, root: PolicyLeaf<P>) -> Self {
        log::debug!(
            "Created quadtree over {} with {} items",
            root.bounds(),
            root.len()
        );
        QuadTree {
            policy,
            config: QuadTreeConfig::default(),
            root: Node::Leaf(root),
        }
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn with_config(mut self, config: QuadTreeConfig) -> QuadTreeResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    pub fn root(&self) -> &PolicyNode<P> {
        &self.root
    }

    pub fn into_root(self) -> PolicyNode<P> {
        self.root
    }

    pub fn bounds(&self) -> BoundingBox {
        self.root.bounds()
    }

    pub fn average(&self) -> &P::Average {
        self.root.average(&self.policy)
    }

    pub fn content(&self) -> Content<'_, P::Content, P::Average> {
        self.root.content()
    }

    pub fn leaves(&self) -> Leaves<'_, P::Content, P::Average> {
        self.root.leaves()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.root.contains_point(x, y)
    }

    pub fn contains_item(&self, item: &P::Content) -> bool {
        self.root.contains_item(&self.policy, item)
    }

    pub fn find_leaf(&self, x: f64, y: f64) -> Option<&PolicyLeaf<P>> {
        self.root.find_leaf(x, y)
    }

    pub fn leaf(&self, id: LeafId) -> Option<&PolicyLeaf<P>> {
        self.root.leaf(id)
    }

    /// Untargeted split of the root, see [`Node::split`].
    pub fn split(&mut self) -> QuadTreeResult<usize> {
        self.root.split(&self.policy, &self.config)
    }

    /// Splits the leaf containing `(x, y)` at that point, see [`Node::split_at`].
    pub fn split_at(&mut self, x: f64, y: f64) -> QuadTreeResult<()> {
        self.root.split_at(&self.policy, &self.config, x, y)
    }

    /// Splits the leaf `id` at `(x, y)`. Unknown ids are a no-op returning `false`.
    pub fn split_leaf(&mut self, id: LeafId, x: f64, y: f64) -> QuadTreeResult<bool> {
        self.root
            .split_leaf(&self.policy, &self.config, Some(id), x, y)
    }

    /// Like [`split_leaf`](Self::split_leaf), but an unknown id is an error.
    ///
    /// # Errors
    ///
    /// `LeafNotFound` if no leaf has this id, `SplitPointOutOfRange` if the
    /// point is on or outside the leaf's edge.
    pub fn try_split_leaf(&mut self, id: LeafId, x: f64, y: f64) -> QuadTreeResult<()> {
        if self.split_leaf(id, x, y)? {
            Ok(())
        } else {
            log::error!("No leaf with id {} in this tree", id);
            Err(QuadTreeError::LeafNotFound(id))
        }
    }

    /// Repeats policy-selected splits until the policy selects nothing or the
    /// configured round limit is reached. Returns the number of rounds that
    /// split at least one leaf.
    ///
    /// Unlike [`split`](Self::split) on a root leaf, the root is only split if
    /// the policy selects it.
    pub fn refine(&mut self) -> QuadTreeResult<usize> {
        let mut rounds = 0;
        while rounds < self.config.max_refine_rounds() {
            let split_count = self.root.split_selected(&self.policy, &self.config)?;
            if split_count == 0 {
                break;
            }
            rounds += 1;
            log::debug!(
                "Refine round {} split {} leaves, {} leaves total",
                rounds,
                split_count,
                self.root.leaf_count()
            );
        }
        if rounds == self.config.max_refine_rounds() {
            log::warn!("Refine stopped at the limit of {} rounds", rounds);
        }
        Ok(rounds)
    }
}
