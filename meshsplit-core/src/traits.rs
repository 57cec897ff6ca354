//! Core traits for meshsplit

use crate::{mesh::*, point::*};

/// Trait for objects with a spatial extent
pub trait Bounded {
    /// Get the axis-aligned bounding box of the object as `(min, max)`
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

impl Bounded for [Point3f] {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let Some(&first) = self.first() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = first;
        let mut max = first;

        for vertex in self {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }
}

impl Bounded for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        self.vertices.as_slice().bounding_box()
    }
}
