//! View-dependent state for terrain selection: the camera, its view frustum,
//! incremental frustum outcodes, and double-precision bounding boxes.

mod aabb;
mod camera;
mod frustum;
mod outcode;
mod plane;

pub use aabb::Aabb;
pub use camera::Camera;
pub use frustum::{BOTTOM, FAR, Frustum, LEFT, NEAR, RIGHT, TOP};
pub use outcode::Outcode;
pub use plane::Plane;
