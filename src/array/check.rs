//! Shape checks run before any bounding box work is scheduled.

use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;

use crate::array::util::OffsetBufferUtils;
use crate::error::{BoundsError, Result};

/// Checks that a linestring offset buffer addresses exactly `num_vertices` vertices.
pub fn check_line_string_offsets<O: OffsetSizeTrait>(
    num_vertices: usize,
    geom_offsets: &OffsetBuffer<O>,
) -> Result<()> {
    if geom_offsets.last_offset() != num_vertices {
        return Err(BoundsError::InvalidGeometry(format!(
            "largest geometry offset ({}) must match vertex count ({})",
            geom_offsets.last_offset(),
            num_vertices
        )));
    }

    Ok(())
}

/// Checks that the polygon/ring/vertex triad is mutually consistent.
///
/// - the largest ring offset must equal the number of vertices
/// - the largest geometry offset must equal the number of rings
pub fn check_polygon_offsets<O: OffsetSizeTrait>(
    num_vertices: usize,
    geom_offsets: &OffsetBuffer<O>,
    ring_offsets: &OffsetBuffer<O>,
) -> Result<()> {
    if ring_offsets.last_offset() != num_vertices {
        return Err(BoundsError::InvalidGeometry(format!(
            "largest ring offset ({}) must match vertex count ({})",
            ring_offsets.last_offset(),
            num_vertices
        )));
    }

    if geom_offsets.last_offset() != ring_offsets.num_groups() {
        return Err(BoundsError::InvalidGeometry(format!(
            "largest geometry offset ({}) must match ring count ({})",
            geom_offsets.last_offset(),
            ring_offsets.num_groups()
        )));
    }

    Ok(())
}
