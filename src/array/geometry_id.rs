//! Lazy expansion of nested offsets into one geometry id per vertex.
//!
//! A linestring array maps each vertex to the linestring that owns it through a single offset
//! buffer. A polygon array needs two: the ring that owns a vertex, then the polygon that owns
//! that ring. Both collapse into the same shape once the vertex start of every top-level
//! geometry is known, so both are served by [`GeometryIds`] over a [`GroupOffsets`] source.

use std::iter::FusedIterator;
use std::ops::Range;

use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;

use crate::array::util::OffsetBufferUtils;
use crate::execution::ExecutionContext;

/// Where each top-level geometry starts in the flat vertex array.
pub trait GroupOffsets: Sync {
    /// The number of top-level geometries.
    fn num_groups(&self) -> usize;

    /// The vertex index where group `index` starts, for `index` in `0..=num_groups()`.
    ///
    /// `group_start(num_groups())` is one past the last vertex.
    fn group_start(&self, index: usize) -> usize;
}

/// Offsets straight into the vertex array, as used by linestrings.
#[derive(Debug, Clone, Copy)]
pub struct OneLevel<'a, O: OffsetSizeTrait> {
    geom_offsets: &'a OffsetBuffer<O>,
}

impl<'a, O: OffsetSizeTrait> GroupOffsets for OneLevel<'a, O> {
    #[inline]
    fn num_groups(&self) -> usize {
        self.geom_offsets.num_groups()
    }

    #[inline]
    fn group_start(&self, index: usize) -> usize {
        self.geom_offsets[index].as_usize()
    }
}

/// Geometry offsets into a ring array, and ring offsets into the vertex array, as used by
/// polygons. Every ring of a polygon, holes included, belongs to that polygon's group.
#[derive(Debug, Clone, Copy)]
pub struct TwoLevel<'a, O: OffsetSizeTrait> {
    geom_offsets: &'a OffsetBuffer<O>,
    ring_offsets: &'a OffsetBuffer<O>,
}

impl<'a, O: OffsetSizeTrait> GroupOffsets for TwoLevel<'a, O> {
    #[inline]
    fn num_groups(&self) -> usize {
        self.geom_offsets.num_groups()
    }

    #[inline]
    fn group_start(&self, index: usize) -> usize {
        let ring = self.geom_offsets[index].as_usize();
        self.ring_offsets[ring].as_usize()
    }
}

/// The geometry id of every vertex covered by a set of offsets, computed on demand.
///
/// The offsets must be non-decreasing and every offset must be in bounds of the array it
/// references. Nothing here checks that; see [`crate::array::check`].
#[derive(Debug, Clone, Copy)]
pub struct GeometryIds<S: GroupOffsets> {
    offsets: S,
}

impl<'a, O: OffsetSizeTrait> GeometryIds<OneLevel<'a, O>> {
    /// Ids for the vertices of a linestring array.
    pub fn from_line_string_offsets(geom_offsets: &'a OffsetBuffer<O>) -> Self {
        Self {
            offsets: OneLevel { geom_offsets },
        }
    }
}

impl<'a, O: OffsetSizeTrait> GeometryIds<TwoLevel<'a, O>> {
    /// Ids for the vertices of a polygon array. All rings of polygon `i` map to `i`.
    pub fn from_polygon_offsets(
        geom_offsets: &'a OffsetBuffer<O>,
        ring_offsets: &'a OffsetBuffer<O>,
    ) -> Self {
        Self {
            offsets: TwoLevel {
                geom_offsets,
                ring_offsets,
            },
        }
    }
}

impl<S: GroupOffsets> GeometryIds<S> {
    /// The number of top-level geometries.
    pub fn num_geometries(&self) -> usize {
        self.offsets.num_groups()
    }

    /// The range of vertex indices owned by some geometry.
    pub fn vertex_range(&self) -> Range<usize> {
        let num_groups = self.offsets.num_groups();
        self.offsets.group_start(0)..self.offsets.group_start(num_groups)
    }

    /// The number of ids in the sequence, one per vertex.
    pub fn len(&self) -> usize {
        self.vertex_range().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id of the geometry that owns `vertex`.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is outside [`Self::vertex_range`].
    pub fn id_at(&self, vertex: usize) -> usize {
        assert!(
            self.vertex_range().contains(&vertex),
            "vertex {vertex} is not covered by the offsets"
        );

        // Largest group whose start is <= vertex. Empty groups share their start with the
        // following group and are never selected.
        let (mut lo, mut hi) = (0, self.offsets.num_groups());
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.offsets.group_start(mid) <= vertex {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Iterates the ids of every vertex in [`Self::vertex_range`].
    pub fn iter(&self) -> GeometryIdIter<'_, S> {
        self.iter_range(self.vertex_range())
    }

    /// Iterates the ids of the vertices in `range`.
    ///
    /// The owning geometry of `range.start` is found once by binary search; the rest are
    /// produced by walking the offsets forward.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty `range` is not contained in [`Self::vertex_range`].
    pub fn iter_range(&self, range: Range<usize>) -> GeometryIdIter<'_, S> {
        if range.is_empty() {
            return GeometryIdIter {
                offsets: &self.offsets,
                group: 0,
                next_start: range.end,
                vertex: range.start,
                end: range.start,
            };
        }

        let covered = self.vertex_range();
        assert!(
            covered.start <= range.start && range.end <= covered.end,
            "vertex range {range:?} is not covered by the offsets ({covered:?})"
        );

        let group = self.id_at(range.start);
        GeometryIdIter {
            offsets: &self.offsets,
            group,
            next_start: self.offsets.group_start(group + 1),
            vertex: range.start,
            end: range.end,
        }
    }

    /// Writes out the full id sequence, for backends that cannot consume it lazily.
    pub fn materialize<C: ExecutionContext>(&self, ctx: &C) -> Vec<usize> {
        let start = self.vertex_range().start;
        ctx.map(self.len(), |i| self.id_at(start + i))
    }
}

impl<'a, S: GroupOffsets> IntoIterator for &'a GeometryIds<S> {
    type Item = usize;
    type IntoIter = GeometryIdIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over geometry ids, see [`GeometryIds::iter_range`].
#[derive(Debug, Clone)]
pub struct GeometryIdIter<'a, S: GroupOffsets> {
    offsets: &'a S,
    group: usize,
    next_start: usize,
    vertex: usize,
    end: usize,
}

impl<'a, S: GroupOffsets> Iterator for GeometryIdIter<'a, S> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.vertex >= self.end {
            return None;
        }

        while self.vertex >= self.next_start {
            self.group += 1;
            self.next_start = self.offsets.group_start(self.group + 1);
        }

        self.vertex += 1;
        Some(self.group)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.vertex;
        (remaining, Some(remaining))
    }
}

impl<'a, S: GroupOffsets> ExactSizeIterator for GeometryIdIter<'a, S> {}

impl<'a, S: GroupOffsets> FusedIterator for GeometryIdIter<'a, S> {}
