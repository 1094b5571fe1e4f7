use crate::constants::QUADRANT_COUNT;
use crate::errors::{Axis, QuadTreeError, QuadTreeResult};

/// A 2D region of a quadtree node, represented by minimum and maximum coordinates.
///
/// Bounds are half-open: the minimum edges belong to the region and the maximum
/// edges belong to the neighbouring region. A point `(x, y)` is inside iff
/// `min_x <= x < max_x` and `min_y <= y < max_y`, so the four quadrants produced
/// by a split never share a point.
///
/// # Examples
///
/// ```rust
/// use quadtree::BoundingBox;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// assert!(bbox.contains_point(0.0, 0.0));
/// assert!(!bbox.contains_point(10.0, 5.0));
/// ```
#[derive(Clone, Copy, PartialEq, Default, Debug, serde::Deserialize, serde::Serialize)]
pub struct BoundingBox {
    /// Minimum X coordinate (inclusive)
    pub min_x: f64,
    /// Minimum Y coordinate (inclusive)
    pub min_y: f64,
    /// Maximum X coordinate (exclusive)
    pub max_x: f64,
    /// Maximum Y coordinate (exclusive)
    pub max_y: f64,
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// One of the four regions a branch is divided into.
///
/// Declaration order is the traversal order used for content and leaf
/// enumeration and for average aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopRight,
    BottomRight,
    BottomLeft,
    TopLeft,
}

impl Quadrant {
    /// All quadrants in traversal order.
    pub const ALL: [Quadrant; QUADRANT_COUNT] = [
        Quadrant::TopRight,
        Quadrant::BottomRight,
        Quadrant::BottomLeft,
        Quadrant::TopLeft,
    ];

    /// Position of this quadrant in [`Quadrant::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The quadrant around `split` that a point falls in. Points on a split
    /// line go to the side holding that line as its minimum edge.
    pub fn around(split: (f64, f64), x: f64, y: f64) -> Quadrant {
        match (x >= split.0, y >= split.1) {
            (true, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomRight,
            (false, false) => Quadrant::BottomLeft,
            (false, true) => Quadrant::TopLeft,
        }
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified coordinates.
    ///
    /// # Arguments
    ///
    /// * `min_x` - Minimum X coordinate
    /// * `min_y` - Minimum Y coordinate
    /// * `max_x` - Maximum X coordinate
    /// * `max_y` - Maximum Y coordinate
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a bounding box and rejects NaN coordinates or inverted edges.
    pub fn try_new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> QuadTreeResult<BoundingBox> {
        BoundingBox::new(min_x, min_y, max_x, max_y).validated()
    }

    /// Returns the smallest box covering every point, with the maxima nudged up
    /// to the next representable value so the extreme points are inside.
    ///
    /// # Errors
    ///
    /// `EmptyContent` when `points` yields nothing, `InvalidBounds` when a
    /// coordinate is NaN or infinite.
    pub fn covering<I>(points: I) -> QuadTreeResult<BoundingBox>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut points = points.into_iter().peekable();
        if points.peek().is_none() {
            log::error!("Cannot infer bounds from an empty content set");
            return Err(QuadTreeError::EmptyContent);
        }

        let mut bbox = BoundingBox::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for (x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                log::error!("Cannot infer bounds from a non-finite coordinate ({}, {})", x, y);
                return Err(QuadTreeError::InvalidBounds(BoundingBox::new(x, y, x, y)));
            }
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox.max_x = next_up(bbox.max_x);
        bbox.max_y = next_up(bbox.max_y);

        log::trace!("Inferred covering bounds {}", bbox);
        Ok(bbox)
    }

    /// Returns `self` if it is valid, otherwise an `InvalidBounds` error.
    pub fn validated(self) -> QuadTreeResult<BoundingBox> {
        if self.is_valid() {
            Ok(self)
        } else {
            log::error!("Invalid bounds {}", self);
            Err(QuadTreeError::InvalidBounds(self))
        }
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the x coordinate halfway between the vertical edges.
    pub fn x_center(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Returns the y coordinate halfway between the horizontal edges.
    pub fn y_center(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x_center(), self.y_center())
    }

    /// Checks if this bounding box contains a point (min inclusive, max exclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Checks whether every point lies inside this bounding box.
    ///
    /// Vacuously true for no points.
    pub fn contains_all<I>(&self, points: I) -> bool
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().all(|(x, y)| self.contains_point(x, y))
    }

    /// Checks if this bounding box contains another bounding box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Checks whether the two regions share any point. Touching edges do not count.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns the union of this bounding box with another.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Checks if this bounding box is valid (no NaN, min <= max).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Checks that `(x, y)` lies strictly inside, more than `epsilon` away from
    /// every edge.
    ///
    /// # Errors
    ///
    /// `SplitPointOutOfRange` naming the offending axis, or both.
    pub fn validate_split_point(&self, x: f64, y: f64, epsilon: f64) -> QuadTreeResult<()> {
        let x_valid = x - self.min_x > epsilon && self.max_x - x > epsilon;
        let y_valid = y - self.min_y > epsilon && self.max_y - y > epsilon;

        match Axis::from_validity(x_valid, y_valid) {
            None => Ok(()),
            Some(axis) => {
                log::error!(
                    "Split point ({}, {}) is out of range on the {} axis of {}",
                    x,
                    y,
                    axis,
                    self
                );
                Err(QuadTreeError::SplitPointOutOfRange {
                    axis,
                    x,
                    y,
                    bounds: *self,
                })
            }
        }
    }

    /// Returns the four quadrants around `(x, y)` in [`Quadrant::ALL`] order.
    ///
    /// The caller is responsible for validating the split point first.
    pub fn quadrants(&self, x: f64, y: f64) -> [BoundingBox; QUADRANT_COUNT] {
        [
            BoundingBox::new(x, y, self.max_x, self.max_y),
            BoundingBox::new(x, self.min_y, self.max_x, y),
            BoundingBox::new(self.min_x, self.min_y, x, y),
            BoundingBox::new(self.min_x, y, x, self.max_y),
        ]
    }

    /// Returns the region of a single quadrant around `(x, y)`.
    pub fn quadrant(&self, quadrant: Quadrant, x: f64, y: f64) -> BoundingBox {
        self.quadrants(x, y)[quadrant.index()]
    }
}

/// Smallest representable value greater than `v`.
fn next_up(v: f64) -> f64 {
    if v.is_nan() || v == f64::INFINITY {
        return v;
    }
    if v == 0.0 {
        return f64::from_bits(1);
    }
    let bits = v.to_bits();
    if v > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}
