//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Mean position of a triangle's three corners
#[inline]
pub fn triangle_centroid(a: &Point3f, b: &Point3f, c: &Point3f) -> Point3f {
    Point3f::new(
        (a.x + b.x + c.x) / 3.0,
        (a.y + b.y + c.y) / 3.0,
        (a.z + b.z + c.z) / 3.0,
    )
}
