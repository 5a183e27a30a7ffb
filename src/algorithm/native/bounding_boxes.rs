//! Bounding boxes of points, linestrings and polygons stored in flattened offset layouts.

use std::ops::Range;

use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;
use geo::{Coord, CoordFloat};
use tracing::debug;

use crate::algorithm::native::bounding_rect::{reduce_bounding_boxes, BoundingBox};
use crate::array::check::{check_line_string_offsets, check_polygon_offsets};
use crate::array::geometry_id::{GeometryIds, GroupOffsets};
use crate::array::util::OffsetBufferUtils;
use crate::error::{BoundsError, Result};
use crate::execution::ExecutionContext;

fn check_expansion_radius<T: CoordFloat>(expansion_radius: T) -> Result<()> {
    if expansion_radius.is_nan() || expansion_radius < T::zero() {
        return Err(BoundsError::InvalidExpansionRadius(format!(
            "expansion radius must be a non-negative number, got {expansion_radius:?}"
        )));
    }
    Ok(())
}

/// One box per geometry, indexed by geometry id. Geometries that own no vertex get
/// [`BoundingBox::empty`].
fn reduce_geometry_ids<S, T, C>(
    ctx: &C,
    ids: &GeometryIds<S>,
    vertices: &[Coord<T>],
    expansion_radius: T,
) -> Vec<BoundingBox<T>>
where
    S: GroupOffsets,
    T: CoordFloat + Send + Sync,
    C: ExecutionContext,
{
    let first_vertex = ids.vertex_range().start;
    let runs = reduce_bounding_boxes(
        ctx,
        ids.len(),
        move |range: Range<usize>| {
            let vertex_range = first_vertex + range.start..first_vertex + range.end;
            ids.iter_range(vertex_range.clone())
                .zip(vertices[vertex_range].iter().copied())
        },
        expansion_radius,
    );

    // geometry ids are strictly increasing across runs, so every slot is written at most once
    let mut boxes = vec![BoundingBox::empty(); ids.num_geometries()];
    for (geom_idx, bbox) in runs {
        boxes[geom_idx] = bbox;
    }
    boxes
}

/// Computes one bounding box per run of consecutive equal `ids`.
///
/// Every point is grown by `expansion_radius` in every direction before it is merged into its
/// box. Ids are compared only against their predecessor: an id that shows up again after a
/// different id starts a new box.
///
/// ```
/// use geo::coord;
/// use geoarrow_bounds::algorithm::native::point_bounding_boxes;
/// use geoarrow_bounds::execution::SequentialContext;
///
/// let ids = [0, 0, 1, 1, 1];
/// let points = [
///     coord! { x: 0., y: 0. },
///     coord! { x: 2., y: 2. },
///     coord! { x: 5., y: 5. },
///     coord! { x: 5., y: 5. },
///     coord! { x: 7., y: 7. },
/// ];
/// let boxes = point_bounding_boxes(&ids, &points, 0., &SequentialContext).unwrap();
/// assert_eq!(boxes.len(), 2);
/// assert_eq!(boxes[1].min(), coord! { x: 5., y: 5. });
/// assert_eq!(boxes[1].max(), coord! { x: 7., y: 7. });
/// ```
///
/// # Errors
///
/// - if `ids` and `points` have different lengths
/// - if `expansion_radius` is negative or NaN
pub fn point_bounding_boxes<T, K, C>(
    ids: &[K],
    points: &[Coord<T>],
    expansion_radius: T,
    ctx: &C,
) -> Result<Vec<BoundingBox<T>>>
where
    T: CoordFloat + Send + Sync,
    K: Copy + PartialEq + Send + Sync,
    C: ExecutionContext,
{
    if ids.len() != points.len() {
        return Err(BoundsError::InvalidGeometry(format!(
            "id count ({}) must match point count ({})",
            ids.len(),
            points.len()
        )));
    }
    check_expansion_radius(expansion_radius)?;

    let boxes = reduce_bounding_boxes(
        ctx,
        points.len(),
        move |range: Range<usize>| {
            ids[range.clone()]
                .iter()
                .copied()
                .zip(points[range].iter().copied())
        },
        expansion_radius,
    )
    .into_iter()
    .map(|(_, bbox)| bbox)
    .collect::<Vec<_>>();
    debug!(
        num_points = points.len(),
        num_boxes = boxes.len(),
        "computed point bounding boxes"
    );
    Ok(boxes)
}

/// Computes the bounding box of every linestring.
///
/// `linestring_offsets` holds one more entry than there are linestrings; linestring `i` owns
/// `vertices[offsets[i]..offsets[i + 1]]` and its box is at index `i` of the result. A
/// linestring with no vertices gets [`BoundingBox::empty`]. With no linestrings or no vertices
/// at all the result is empty and nothing is checked.
///
/// # Errors
///
/// - if the largest offset does not match the number of vertices
/// - if `expansion_radius` is negative or NaN
pub fn linestring_bounding_boxes<O, T, C>(
    linestring_offsets: &OffsetBuffer<O>,
    vertices: &[Coord<T>],
    expansion_radius: T,
    ctx: &C,
) -> Result<Vec<BoundingBox<T>>>
where
    O: OffsetSizeTrait,
    T: CoordFloat + Send + Sync,
    C: ExecutionContext,
{
    let num_line_strings = linestring_offsets.num_groups();
    let num_vertices = vertices.len();
    if num_line_strings == 0 || num_vertices == 0 {
        return Ok(vec![]);
    }

    check_line_string_offsets(num_vertices, linestring_offsets)?;
    check_expansion_radius(expansion_radius)?;

    let ids = GeometryIds::from_line_string_offsets(linestring_offsets);
    let boxes = reduce_geometry_ids(ctx, &ids, vertices, expansion_radius);
    debug!(
        num_line_strings,
        num_vertices,
        num_boxes = boxes.len(),
        "computed linestring bounding boxes"
    );
    Ok(boxes)
}

/// Computes the bounding box of every polygon.
///
/// `polygon_offsets` index into the rings described by `ring_offsets`, which in turn index into
/// `vertices`. A polygon's box covers all of its rings; interior rings are not treated
/// differently from the exterior. The box of polygon `i` is at index `i` of the result, and a
/// polygon with no vertices gets [`BoundingBox::empty`].
///
/// ```
/// use arrow_buffer::OffsetBuffer;
/// use geo::coord;
/// use geoarrow_bounds::algorithm::native::polygon_bounding_boxes;
/// use geoarrow_bounds::execution::SequentialContext;
///
/// let polygon_offsets = OffsetBuffer::<i32>::new(vec![0, 1].into());
/// let ring_offsets = OffsetBuffer::<i32>::new(vec![0, 4].into());
/// let vertices = [
///     coord! { x: 0., y: 0. },
///     coord! { x: 1., y: 0. },
///     coord! { x: 0., y: 1. },
///     coord! { x: 0., y: 0. },
/// ];
/// let boxes =
///     polygon_bounding_boxes(&polygon_offsets, &ring_offsets, &vertices, 0.5, &SequentialContext)
///         .unwrap();
/// assert_eq!(boxes[0].min(), coord! { x: -0.5, y: -0.5 });
/// assert_eq!(boxes[0].max(), coord! { x: 1.5, y: 1.5 });
/// ```
///
/// # Errors
///
/// Checked before any work is scheduled, and only when there is at least one polygon:
///
/// - if the largest ring offset does not match the number of vertices
/// - if the largest polygon offset does not match the number of rings
/// - if `expansion_radius` is negative or NaN
pub fn polygon_bounding_boxes<O, T, C>(
    polygon_offsets: &OffsetBuffer<O>,
    ring_offsets: &OffsetBuffer<O>,
    vertices: &[Coord<T>],
    expansion_radius: T,
    ctx: &C,
) -> Result<Vec<BoundingBox<T>>>
where
    O: OffsetSizeTrait,
    T: CoordFloat + Send + Sync,
    C: ExecutionContext,
{
    let num_polygons = polygon_offsets.num_groups();
    let num_rings = ring_offsets.num_groups();
    let num_vertices = vertices.len();
    if num_polygons == 0 {
        return Ok(vec![]);
    }

    check_polygon_offsets(num_vertices, polygon_offsets, ring_offsets)?;
    if num_rings == 0 || num_vertices == 0 {
        return Ok(vec![]);
    }
    check_expansion_radius(expansion_radius)?;

    let ids = GeometryIds::from_polygon_offsets(polygon_offsets, ring_offsets);
    let boxes = reduce_geometry_ids(ctx, &ids, vertices, expansion_radius);
    debug!(
        num_polygons,
        num_rings,
        num_vertices,
        num_boxes = boxes.len(),
        "computed polygon bounding boxes"
    );
    Ok(boxes)
}

/// Computes the bounding box of every trajectory.
///
/// `object_ids` and `points` must be sorted so that the points of each object are
/// contiguous, e.g. by object id and then timestamp.
///
/// # Errors
///
/// - if `object_ids` and `points` have different lengths
/// - if the ids do not form exactly `num_trajectories` contiguous runs
pub fn trajectory_bounding_boxes<T, K, C>(
    num_trajectories: usize,
    object_ids: &[K],
    points: &[Coord<T>],
    ctx: &C,
) -> Result<Vec<BoundingBox<T>>>
where
    T: CoordFloat + Send + Sync,
    K: Copy + PartialEq + Send + Sync,
    C: ExecutionContext,
{
    let boxes = point_bounding_boxes(object_ids, points, T::zero(), ctx)?;
    if boxes.len() != num_trajectories {
        return Err(BoundsError::InvalidGeometry(format!(
            "expected {} trajectories but object ids form {} contiguous runs",
            num_trajectories,
            boxes.len()
        )));
    }
    Ok(boxes)
}

#[cfg(test)]
mod test {
    use geo::coord;

    use super::*;
    use crate::algorithm::native::eq::{float_equal, DEFAULT_MAX_ULP};
    use crate::execution::SequentialContext;
    use crate::test::{linestring, point, polygon};

    fn bbox(min: (f64, f64), max: (f64, f64)) -> BoundingBox<f64> {
        BoundingBox::new(coord! { x: min.0, y: min.1 }, coord! { x: max.0, y: max.1 })
    }

    fn bit_identical(a: &[BoundingBox<f64>], b: &[BoundingBox<f64>]) -> bool {
        let bits = |boxes: &[BoundingBox<f64>]| {
            boxes
                .iter()
                .flat_map(|b| [b.min().x, b.min().y, b.max().x, b.max().y])
                .map(f64::to_bits)
                .collect::<Vec<_>>()
        };
        bits(a) == bits(b)
    }

    #[test]
    fn points() {
        let ids = [0, 0, 1, 1, 1];
        let points = [
            coord! { x: 0., y: 0. },
            coord! { x: 2., y: 2. },
            coord! { x: 5., y: 5. },
            coord! { x: 5., y: 5. },
            coord! { x: 7., y: 7. },
        ];
        let boxes = point_bounding_boxes(&ids, &points, 0., &SequentialContext).unwrap();
        assert_eq!(boxes, vec![bbox((0., 0.), (2., 2.)), bbox((5., 5.), (7., 7.))]);
    }

    #[test]
    fn single_point_with_radius() {
        let boxes =
            point_bounding_boxes(&[0], &[coord! { x: 0., y: 0. }], 1., &SequentialContext).unwrap();
        assert_eq!(boxes, vec![bbox((-1., -1.), (1., 1.))]);
    }

    #[test]
    fn f32_points() {
        let points = [coord! { x: 0.5f32, y: 1.5 }, coord! { x: -0.5, y: 2.5 }];
        let boxes = point_bounding_boxes(&[3u8, 3], &points, 0.25, &SequentialContext).unwrap();
        assert_eq!(boxes[0].min(), coord! { x: -0.75, y: 1.25 });
        assert_eq!(boxes[0].max(), coord! { x: 0.75, y: 2.75 });
    }

    #[test]
    fn non_adjacent_repeated_id() {
        let ids = [0, 0, 1, 0];
        let points = [
            coord! { x: 0., y: 0. },
            coord! { x: 1., y: 1. },
            coord! { x: 2., y: 2. },
            coord! { x: 10., y: 10. },
        ];
        let boxes = point_bounding_boxes(&ids, &points, 0., &SequentialContext).unwrap();
        assert_eq!(
            boxes,
            vec![
                bbox((0., 0.), (1., 1.)),
                bbox((2., 2.), (2., 2.)),
                bbox((10., 10.), (10., 10.)),
            ]
        );
    }

    #[test]
    fn point_length_mismatch() {
        let err = point_bounding_boxes(&[0, 1], &[coord! { x: 0., y: 0. }], 0., &SequentialContext)
            .unwrap_err();
        assert!(matches!(err, BoundsError::InvalidGeometry(_)));
    }

    #[test]
    fn invalid_radius() {
        let points = [coord! { x: 0., y: 0. }];
        for radius in [-1., f64::NAN] {
            let err = point_bounding_boxes(&[0], &points, radius, &SequentialContext).unwrap_err();
            assert!(matches!(err, BoundsError::InvalidExpansionRadius(_)));
        }

        let err = point_bounding_boxes(&[0], &points, -1.5, &SequentialContext).unwrap_err();
        assert!(err.to_string().ends_with("got -1.5"), "{err}");
    }

    #[test]
    fn nan_coordinates_propagate() {
        let points = [coord! { x: 1., y: f64::NAN }, coord! { x: 2., y: 3. }];
        let boxes = point_bounding_boxes(&[0, 0], &points, 0., &SequentialContext).unwrap();
        assert_eq!(boxes[0].min().x, 1.);
        assert_eq!(boxes[0].max().x, 2.);
        assert!(boxes[0].min().y.is_nan());
        assert!(boxes[0].max().y.is_nan());
    }

    #[test]
    fn linestrings() {
        let parts = linestring::ls_parts();
        let boxes =
            linestring_bounding_boxes(&parts.geom_offsets, &parts.vertices, 0., &SequentialContext)
                .unwrap();
        assert_eq!(boxes, vec![bbox((0., 1.), (1., 2.)), bbox((3., -6.), (5., 4.))]);
    }

    #[test]
    fn linestrings_with_radius() {
        let offsets = OffsetBuffer::<i32>::new(vec![0, 3, 5].into());
        let vertices = (0..5)
            .map(|i| coord! { x: i as f64, y: -(i as f64) })
            .collect::<Vec<_>>();
        let boxes = linestring_bounding_boxes(&offsets, &vertices, 2., &SequentialContext).unwrap();
        assert_eq!(boxes, vec![bbox((-2., -4.), (4., 2.)), bbox((1., -6.), (6., -1.))]);
    }

    #[test]
    fn empty_linestrings() {
        let vertices = [coord! { x: 0., y: 0. }];
        let no_geoms = OffsetBuffer::<i32>::new(vec![0].into());
        assert!(linestring_bounding_boxes(&no_geoms, &vertices, 0., &SequentialContext)
            .unwrap()
            .is_empty());

        let offsets = OffsetBuffer::<i32>::new(vec![0, 3, 5].into());
        assert!(linestring_bounding_boxes::<_, f64, _>(&offsets, &[], 0., &SequentialContext)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn empty_linestring_keeps_its_slot() {
        let offsets = OffsetBuffer::<i32>::new(vec![0, 2, 2, 4].into());
        let vertices = (0..4)
            .map(|i| coord! { x: i as f64, y: i as f64 })
            .collect::<Vec<_>>();
        let boxes = linestring_bounding_boxes(&offsets, &vertices, 0., &SequentialContext).unwrap();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0], bbox((0., 0.), (1., 1.)));
        assert!(boxes[1].is_empty());
        assert_eq!(boxes[2], bbox((2., 2.), (3., 3.)));
    }

    #[test]
    fn empty_linestrings_at_the_ends() {
        let offsets = OffsetBuffer::<i64>::new(vec![0, 0, 0, 3, 3].into());
        let vertices = vec![coord! { x: 1., y: -1. }; 3];
        let boxes =
            linestring_bounding_boxes(&offsets, &vertices, 0.5, &SequentialContext).unwrap();
        assert_eq!(boxes.len(), 4);
        assert!(boxes[0].is_empty());
        assert!(boxes[1].is_empty());
        assert_eq!(boxes[2], bbox((0.5, -1.5), (1.5, -0.5)));
        assert!(boxes[3].is_empty());
    }

    #[test]
    fn linestring_offsets_mismatch() {
        let offsets = OffsetBuffer::<i64>::new(vec![0, 3, 5].into());
        let vertices = vec![coord! { x: 0., y: 0. }; 4];
        let err =
            linestring_bounding_boxes(&offsets, &vertices, 0., &SequentialContext).unwrap_err();
        assert!(matches!(err, BoundsError::InvalidGeometry(_)));
    }

    #[test]
    fn polygon_box_covers_holes() {
        let parts = polygon::p_parts();
        let boxes = polygon_bounding_boxes(
            &parts.geom_offsets,
            &parts.ring_offsets,
            &parts.vertices,
            0.,
            &SequentialContext,
        )
        .unwrap();
        assert_eq!(boxes, vec![bbox((0., 0.), (12., 10.)), bbox((-5., -5.), (-1., -1.))]);
    }

    #[test]
    fn empty_polygons_keep_their_slots() {
        let vertices = (0..4)
            .map(|i| coord! { x: i as f64, y: 10. - i as f64 })
            .collect::<Vec<_>>();

        // polygon 1 has no rings
        let polygon_offsets = OffsetBuffer::<i32>::new(vec![0, 1, 1, 2].into());
        let ring_offsets = OffsetBuffer::<i32>::new(vec![0, 2, 4].into());
        let boxes = polygon_bounding_boxes(
            &polygon_offsets,
            &ring_offsets,
            &vertices,
            0.,
            &SequentialContext,
        )
        .unwrap();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0], bbox((0., 9.), (1., 10.)));
        assert!(boxes[1].is_empty());
        assert_eq!(boxes[2], bbox((2., 7.), (3., 8.)));

        // first polygon has an empty ring, last polygon has no rings
        let polygon_offsets = OffsetBuffer::<i32>::new(vec![0, 1, 3, 3].into());
        let ring_offsets = OffsetBuffer::<i32>::new(vec![0, 0, 1, 4].into());
        let boxes = polygon_bounding_boxes(
            &polygon_offsets,
            &ring_offsets,
            &vertices,
            0.,
            &SequentialContext,
        )
        .unwrap();
        assert_eq!(boxes.len(), 3);
        assert!(boxes[0].is_empty());
        assert_eq!(boxes[1], bbox((0., 7.), (3., 10.)));
        assert!(boxes[2].is_empty());
    }

    #[test]
    fn inconsistent_polygon_triad() {
        let polygon_offsets = OffsetBuffer::<i32>::new(vec![0, 2].into());
        let ring_offsets = OffsetBuffer::<i32>::new(vec![0, 5, 10].into());
        let vertices = vec![coord! { x: 0., y: 0. }; 7];
        let err = polygon_bounding_boxes(
            &polygon_offsets,
            &ring_offsets,
            &vertices,
            0.,
            &SequentialContext,
        )
        .unwrap_err();
        assert!(matches!(err, BoundsError::InvalidGeometry(_)));
    }

    #[test]
    fn empty_polygons() {
        let vertices = vec![coord! { x: 0., y: 0. }; 3];

        // no polygons: returned without looking at the other buffers
        let polygon_offsets = OffsetBuffer::<i32>::new(vec![0].into());
        let ring_offsets = OffsetBuffer::<i32>::new(vec![0, 99].into());
        let boxes = polygon_bounding_boxes(
            &polygon_offsets,
            &ring_offsets,
            &vertices,
            0.,
            &SequentialContext,
        )
        .unwrap();
        assert!(boxes.is_empty());

        // polygons without rings still go through validation
        let polygon_offsets = OffsetBuffer::<i32>::new(vec![0, 0].into());
        let ring_offsets = OffsetBuffer::<i32>::new(vec![0].into());
        let boxes = polygon_bounding_boxes::<_, f64, _>(
            &polygon_offsets,
            &ring_offsets,
            &[],
            0.,
            &SequentialContext,
        )
        .unwrap();
        assert!(boxes.is_empty());
        assert!(polygon_bounding_boxes(
            &polygon_offsets,
            &ring_offsets,
            &vertices,
            0.,
            &SequentialContext
        )
        .is_err());
    }

    #[test]
    fn trajectories() {
        let (object_ids, points) = point::trajectories();
        let boxes = trajectory_bounding_boxes(2, &object_ids, &points, &SequentialContext).unwrap();
        assert_eq!(boxes, vec![bbox((0., 0.), (2., 2.)), bbox((1., 1.), (3., 3.))]);

        let err =
            trajectory_bounding_boxes(3, &object_ids, &points, &SequentialContext).unwrap_err();
        assert!(err.to_string().contains("2 contiguous runs"));
    }

    #[test]
    fn rounding_in_expanded_boxes() {
        let points = [coord! { x: 0.1, y: 0.7 }];
        let boxes = point_bounding_boxes(&[0], &points, 0.2, &SequentialContext).unwrap();
        assert!(float_equal::<DEFAULT_MAX_ULP, _>(boxes[0].max().x, 0.3));
        assert!(float_equal::<DEFAULT_MAX_ULP, _>(boxes[0].min().y, 0.5));
    }

    #[test]
    fn partitioning_is_bit_identical() {
        use crate::execution::{chunk_ranges, reduce_runs, stitch_runs};

        let ids = (0..500u32).map(|i| i / 7).collect::<Vec<_>>();
        // sprinkle signed zeros in so that tie breaking between -0 and +0 is exercised
        let points = (0..500)
            .map(|i| {
                let t = i as f64 * 0.37;
                let x = match i % 6 {
                    0 => 0.0,
                    3 => -0.0,
                    _ => t.sin() * 100.,
                };
                coord! { x: x, y: t.cos() }
            })
            .collect::<Vec<_>>();
        let expected = point_bounding_boxes(&ids, &points, 0., &SequentialContext).unwrap();

        for chunk_len in [1, 2, 3, 7, 64, 499, 1000] {
            let partials = chunk_ranges(points.len(), chunk_len)
                .map(|range| {
                    let tagged = ids[range.clone()].iter().copied().zip(
                        points[range]
                            .iter()
                            .map(|p| BoundingBox::from_point(*p, 0.)),
                    );
                    reduce_runs(tagged, &BoundingBox::merge)
                })
                .collect::<Vec<_>>();
            let boxes = stitch_runs(partials, &BoundingBox::merge)
                .into_iter()
                .map(|(_, bbox)| bbox)
                .collect::<Vec<_>>();
            assert!(bit_identical(&boxes, &expected), "chunk_len {chunk_len}");
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn rayon_polygons_match_sequential() {
        use crate::array::PolygonParts;
        use crate::execution::RayonContext;
        use geo::Translate;

        let polygons = (0..300)
            .map(|i| polygon::p0().translate(i as f64, -(i as f64) * 0.5))
            .collect::<Vec<_>>();
        let parts: PolygonParts = polygons.as_slice().into();
        let ctx = RayonContext::default().with_min_chunk_len(16);

        let expected = polygon_bounding_boxes(
            &parts.geom_offsets,
            &parts.ring_offsets,
            &parts.vertices,
            0.5,
            &SequentialContext,
        )
        .unwrap();
        let boxes = polygon_bounding_boxes(
            &parts.geom_offsets,
            &parts.ring_offsets,
            &parts.vertices,
            0.5,
            &ctx,
        )
        .unwrap();
        assert_eq!(boxes.len(), 300);
        assert!(bit_identical(&boxes, &expected));
    }
}
