//! Grouped bounding boxes over geometries stored in GeoArrow's flattened offset layout, plus a
//! ULP-based float comparator for checking the results.
//!
//! Linestrings and polygons are described by offset buffers into a flat vertex array. Every
//! vertex is tagged with the index of the geometry that owns it
//! ([`array::GeometryIds`]), and a segmented min/max reduction turns each run of equal tags
//! into one [`BoundingBox`]. The reduction runs on an [`execution::ExecutionContext`], either
//! sequentially or on the rayon thread pool with the `rayon` feature.
//!
//! ```
//! use arrow_buffer::OffsetBuffer;
//! use geo::coord;
//! use geoarrow_bounds::algorithm::native::linestring_bounding_boxes;
//! use geoarrow_bounds::execution::SequentialContext;
//!
//! let offsets = OffsetBuffer::<i32>::new(vec![0, 3, 5].into());
//! let vertices = (0..5)
//!     .map(|i| coord! { x: i as f64, y: 0. })
//!     .collect::<Vec<_>>();
//! let boxes = linestring_bounding_boxes(&offsets, &vertices, 0., &SequentialContext)?;
//! assert_eq!(boxes.len(), 2);
//! assert_eq!(boxes[1].min(), coord! { x: 3., y: 0. });
//! # Ok::<(), geoarrow_bounds::error::BoundsError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub use algorithm::native::BoundingBox;

pub mod algorithm;
pub mod array;
pub mod error;
pub mod execution;
