//! Grouping of timestamped object positions into trajectories.

use std::ops::Range;

use arrow_buffer::OffsetBuffer;
use geo::{Coord, CoordFloat};
use tracing::debug;

use crate::error::{BoundsError, Result};
use crate::execution::ExecutionContext;

/// Object positions sorted by object id and then timestamp, with one trajectory per object.
#[derive(Debug, Clone)]
pub struct Trajectories<K, T: CoordFloat = f64, Ts = i64> {
    pub object_ids: Vec<K>,
    pub points: Vec<Coord<T>>,
    pub timestamps: Vec<Ts>,

    /// Offsets into the sorted arrays where each trajectory starts
    pub offsets: OffsetBuffer<i32>,
}

impl<K, T: CoordFloat, Ts> Trajectories<K, T, Ts> {
    pub fn num_trajectories(&self) -> usize {
        self.offsets.len() - 1
    }
}

/// Sorts positions by `(object_id, timestamp)` and derives one trajectory per object.
///
/// The sort is stable, so positions sharing an object id and a timestamp keep their input
/// order. The result is the expected input of
/// [`trajectory_bounding_boxes`](super::trajectory_bounding_boxes).
///
/// ```
/// use geo::coord;
/// use geoarrow_bounds::algorithm::native::derive_trajectories;
/// use geoarrow_bounds::execution::SequentialContext;
///
/// let object_ids = [0, 1, 0, 1];
/// let points = [
///     coord! { x: 0., y: 0. },
///     coord! { x: 0., y: 0. },
///     coord! { x: 1., y: 1. },
///     coord! { x: 1., y: 1. },
/// ];
/// let timestamps = [0, 10_000, 0, 10_000];
/// let trajectories =
///     derive_trajectories(&object_ids, &points, &timestamps, &SequentialContext).unwrap();
/// assert_eq!(trajectories.offsets.to_vec(), vec![0, 2, 4]);
/// assert_eq!(trajectories.object_ids, vec![0, 0, 1, 1]);
/// ```
///
/// # Errors
///
/// - if `object_ids`, `points` and `timestamps` have different lengths
/// - if there are more positions than fit in `i32` offsets
pub fn derive_trajectories<K, T, Ts, C>(
    object_ids: &[K],
    points: &[Coord<T>],
    timestamps: &[Ts],
    ctx: &C,
) -> Result<Trajectories<K, T, Ts>>
where
    K: Copy + Ord + Send + Sync,
    T: CoordFloat + Send + Sync,
    Ts: Copy + Ord + Send + Sync,
    C: ExecutionContext,
{
    let len = points.len();
    if object_ids.len() != len || timestamps.len() != len {
        return Err(BoundsError::InvalidGeometry(format!(
            "object id count ({}), point count ({}) and timestamp count ({}) must match",
            object_ids.len(),
            len,
            timestamps.len()
        )));
    }
    if i32::try_from(len).is_err() {
        return Err(BoundsError::InvalidGeometry(format!(
            "{len} positions do not fit in i32 offsets"
        )));
    }

    let mut order = (0..len).collect::<Vec<_>>();
    order.sort_by_key(|&i| (object_ids[i], timestamps[i]));

    let sorted_ids = ctx.map(len, |i| object_ids[order[i]]);
    let sorted_points = ctx.map(len, |i| points[order[i]]);
    let sorted_timestamps = ctx.map(len, |i| timestamps[order[i]]);

    let ids = sorted_ids.as_slice();
    let runs = ctx.segmented_reduce(
        len,
        move |range: Range<usize>| ids[range].iter().map(|id| (*id, 1usize)),
        |a, b| a + b,
    );
    let offsets = OffsetBuffer::from_lengths(runs.into_iter().map(|(_, count)| count));
    debug!(
        num_points = len,
        num_trajectories = offsets.len() - 1,
        "derived trajectories"
    );

    Ok(Trajectories {
        object_ids: sorted_ids,
        points: sorted_points,
        timestamps: sorted_timestamps,
        offsets,
    })
}
