//! Flattened offset layouts built from `geo` geometries.
//!
//! Callers that already hold GeoArrow buffers pass offsets and vertices directly to the
//! algorithms. These types are the convenient path from a slice of `geo` geometries.

use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;
use geo::{Coord, CoordFloat, LineString, Polygon};

/// A linestring array as one offset buffer into a flat vertex array.
#[derive(Debug, Clone)]
pub struct LineStringParts<T: CoordFloat = f64, O: OffsetSizeTrait = i32> {
    /// Offsets into the vertex array where each linestring starts
    pub geom_offsets: OffsetBuffer<O>,

    pub vertices: Vec<Coord<T>>,
}

/// A polygon array as geometry offsets into rings and ring offsets into a flat vertex array.
///
/// The exterior ring of each polygon comes first, followed by its interiors.
#[derive(Debug, Clone)]
pub struct PolygonParts<T: CoordFloat = f64, O: OffsetSizeTrait = i32> {
    /// Offsets into the ring array where each polygon starts
    pub geom_offsets: OffsetBuffer<O>,

    /// Offsets into the vertex array where each ring starts
    pub ring_offsets: OffsetBuffer<O>,

    pub vertices: Vec<Coord<T>>,
}

impl<T: CoordFloat, O: OffsetSizeTrait> From<&[LineString<T>]> for LineStringParts<T, O> {
    /// # Panics
    ///
    /// Panics if the vertex count overflows `O`.
    fn from(geoms: &[LineString<T>]) -> Self {
        let geom_offsets = OffsetBuffer::from_lengths(geoms.iter().map(|ls| ls.0.len()));
        let vertices = geoms.iter().flat_map(|ls| ls.0.iter().copied()).collect();
        Self {
            geom_offsets,
            vertices,
        }
    }
}

impl<T: CoordFloat, O: OffsetSizeTrait> From<&[Polygon<T>]> for PolygonParts<T, O> {
    /// # Panics
    ///
    /// Panics if the ring or vertex count overflows `O`.
    fn from(geoms: &[Polygon<T>]) -> Self {
        let rings = || {
            geoms
                .iter()
                .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        };

        let geom_offsets =
            OffsetBuffer::from_lengths(geoms.iter().map(|p| 1 + p.interiors().len()));
        let ring_offsets = OffsetBuffer::from_lengths(rings().map(|ring| ring.0.len()));
        let vertices = rings().flat_map(|ring| ring.0.iter().copied()).collect();
        Self {
            geom_offsets,
            ring_offsets,
            vertices,
        }
    }
}
