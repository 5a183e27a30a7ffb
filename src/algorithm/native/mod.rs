mod bounding_boxes;
pub mod bounding_rect;
pub mod eq;
mod trajectory;

pub use bounding_boxes::{
    linestring_bounding_boxes, point_bounding_boxes, polygon_bounding_boxes,
    trajectory_bounding_boxes,
};
pub use bounding_rect::{reduce_bounding_boxes, BoundingBox};
pub use trajectory::{derive_trajectories, Trajectories};
pub use eq::{float_equal, ulp_distance, UlpFloat, DEFAULT_MAX_ULP};
