//! Flattened offset layouts and the helpers that read them.

pub use geometry_id::{GeometryIdIter, GeometryIds, GroupOffsets, OneLevel, TwoLevel};
pub use parts::{LineStringParts, PolygonParts};
pub use util::OffsetBufferUtils;

pub mod check;
pub mod geometry_id;
pub mod parts;
pub mod util;
