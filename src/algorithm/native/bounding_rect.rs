use std::ops::Range;

use geo::{coord, Coord, CoordFloat, Rect};

use crate::execution::ExecutionContext;

/// An axis-aligned bounding box.
///
/// Outside of NaN input and [`BoundingBox::empty`], `min.x <= max.x` and `min.y <= max.y`. A
/// box where `min == max` is valid, e.g. the box of a single point with no expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<T: CoordFloat = f64> {
    min: Coord<T>,
    max: Coord<T>,
}

impl<T: CoordFloat> BoundingBox<T> {
    pub fn new(min: Coord<T>, max: Coord<T>) -> Self {
        Self { min, max }
    }

    /// The box of a geometry with no vertices: `min` is `+inf` and `max` is `-inf` on both axes.
    ///
    /// This is the identity of [`BoundingBox::merge`], and [`BoundingBox::is_empty`] is the way
    /// to recognize it.
    pub fn empty() -> Self {
        Self {
            min: coord! { x: T::infinity(), y: T::infinity() },
            max: coord! { x: T::neg_infinity(), y: T::neg_infinity() },
        }
    }

    /// Returns `true` if the box contains no point, i.e. `min > max` on some axis.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// The box of `point` grown by `expansion_radius` in every direction.
    #[inline]
    pub fn from_point(point: Coord<T>, expansion_radius: T) -> Self {
        let offset = coord! { x: expansion_radius, y: expansion_radius };
        Self {
            min: point - offset,
            max: point + offset,
        }
    }

    pub fn min(&self) -> Coord<T> {
        self.min
    }

    pub fn max(&self) -> Coord<T> {
        self.max
    }

    /// The smallest box containing both `self` and `other`.
    ///
    /// NaN in either operand propagates to the matching component of the result. Signed zeros
    /// are ordered `-0 < +0`. Together this makes `merge` commutative and associative down to
    /// the bit pattern.
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: coord! {
                x: nan_min(self.min.x, other.min.x),
                y: nan_min(self.min.y, other.min.y),
            },
            max: coord! {
                x: nan_max(self.max.x, other.max.x),
                y: nan_max(self.max.y, other.max.y),
            },
        }
    }
}

#[inline]
fn nan_min<T: CoordFloat>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else if a < b || (a == b && a.is_sign_negative()) {
        a
    } else {
        b
    }
}

#[inline]
fn nan_max<T: CoordFloat>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else if a > b || (a == b && a.is_sign_positive()) {
        a
    } else {
        b
    }
}

impl<T: CoordFloat> From<BoundingBox<T>> for Rect<T> {
    fn from(value: BoundingBox<T>) -> Self {
        Rect::new(value.min, value.max)
    }
}

impl<T: CoordFloat> From<BoundingBox<T>> for ([T; 2], [T; 2]) {
    fn from(value: BoundingBox<T>) -> Self {
        ([value.min.x, value.min.y], [value.max.x, value.max.y])
    }
}

/// Reduces identifier-tagged points to one `(id, box)` per run of consecutive equal
/// identifiers, in input order.
///
/// `tagged_points` yields the `(id, point)` pairs for any sub-range of `0..len`. Every point is
/// expanded by `expansion_radius` before being merged into its run's box. A repeated id that
/// is not adjacent to its earlier run produces a separate box.
pub fn reduce_bounding_boxes<T, K, C, I, It>(
    ctx: &C,
    len: usize,
    tagged_points: I,
    expansion_radius: T,
) -> Vec<(K, BoundingBox<T>)>
where
    T: CoordFloat + Send + Sync,
    K: PartialEq + Send,
    C: ExecutionContext,
    I: Fn(Range<usize>) -> It + Sync + Send,
    It: Iterator<Item = (K, Coord<T>)>,
{
    ctx.segmented_reduce(
        len,
        |range: Range<usize>| {
            tagged_points(range)
                .map(move |(id, point)| (id, BoundingBox::from_point(point, expansion_radius)))
        },
        BoundingBox::merge,
    )
}
