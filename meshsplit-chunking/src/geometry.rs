//! Geometry helpers shared by the partitioner and the chunk extractor

use itertools::Itertools;
use meshsplit_core::{triangle_centroid, Point3f, TriangleMesh};
use serde::{Deserialize, Serialize};

/// Coordinate axis used as the split key at one recursion level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// The axis used one level deeper: x, y, z, x, ...
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Coordinate of `p` along this axis
    #[inline]
    pub fn coord(self, p: &Point3f) -> f32 {
        p[self.index()]
    }
}

/// Per-face centroids, indexed by face id.
///
/// Built once per mesh and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidTable {
    centroids: Vec<Point3f>,
}

impl CentroidTable {
    /// Compute the centroid of every face. Face corners must be in range.
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        let centroids = mesh
            .faces
            .iter()
            .map(|&[a, b, c]| {
                triangle_centroid(&mesh.vertices[a], &mesh.vertices[b], &mesh.vertices[c])
            })
            .collect();
        Self { centroids }
    }

    #[inline]
    pub fn get(&self, face: usize) -> &Point3f {
        &self.centroids[face]
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

/// Sorted, deduplicated global vertex ids referenced by the given faces
pub fn distinct_vertices(faces: &[[usize; 3]], face_indices: &[usize]) -> Vec<usize> {
    face_indices
        .iter()
        .flat_map(|&f| faces[f])
        .sorted_unstable()
        .dedup()
        .collect()
}

/// Number of distinct vertices referenced by the given faces
pub fn unique_vertex_count(faces: &[[usize; 3]], face_indices: &[usize]) -> usize {
    face_indices
        .iter()
        .flat_map(|&f| faces[f])
        .sorted_unstable()
        .dedup()
        .count()
}

/// Median of `values` with the even-length case averaged, or `None` when empty.
///
/// The average is taken in `f32`, the precision the centroids are stored in,
/// so it may round onto one of the two middle values. Reorders `values` in place.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let len = values.len();
    let (lower, upper, _) = values.select_nth_unstable_by(len / 2, f32::total_cmp);
    let upper = *upper;
    if len % 2 == 1 {
        return Some(upper);
    }
    let lower_max = lower.iter().copied().max_by(f32::total_cmp).unwrap_or(upper);
    Some((lower_max + upper) / 2.0)
}
