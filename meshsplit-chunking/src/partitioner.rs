//! Vertex-bounded median-split partitioning
//!
//! Recursively splits a face set at the median of its face centroids along an
//! axis that cycles x, y, z per level, until every leaf references at most
//! `max_unique_vertices` distinct vertices. When the median fails to separate
//! the set (many centroids sharing one coordinate), the set is bisected by
//! position instead so that every split makes progress.

use crate::geometry::{median, unique_vertex_count, Axis, CentroidTable};
use crate::MeshPartitioner;
use log::{debug, info};
use meshsplit_core::{Error, Result, TriangleMesh};
use serde::{Deserialize, Serialize};

/// Vertex budget used when none is configured; fits 16-bit index buffers.
pub const DEFAULT_MAX_UNIQUE_VERTICES: usize = 65_000;

/// Smallest budget that lets a single triangle terminate the recursion.
pub const MIN_UNIQUE_VERTICES: usize = 3;

const DEFAULT_MIN_PARALLEL_FACES: usize = 16_384;

// Past this many nested forks a subtree is finished on the explicit stack.
const MAX_FORK_DEPTH: u32 = 32;

/// One leaf of the partition: a subset of global face ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceIndexSet {
    /// Global face ids, in the order the partitioner produced them
    pub faces: Vec<usize>,
    /// Number of distinct vertices referenced by `faces`
    pub unique_vertices: usize,
    /// Recursion depth at which the leaf was emitted
    pub depth: u32,
}

impl FaceIndexSet {
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Median-split partitioner.
///
/// Sequential runs walk the split tree with an explicit stack, so degenerate
/// inputs that force positional bisection cannot overflow the call stack.
/// Parallel runs fork the two halves of large sets with `rayon::join` and
/// produce exactly the same ordered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianSplitPartitioner {
    /// Maximum number of distinct vertices a leaf may reference. Must be at least 3.
    pub max_unique_vertices: usize,
    /// Fork independent subtrees onto the rayon pool.
    pub parallel: bool,
    /// Sets smaller than this are never forked.
    pub min_parallel_faces: usize,
}

impl Default for MedianSplitPartitioner {
    fn default() -> Self {
        Self {
            max_unique_vertices: DEFAULT_MAX_UNIQUE_VERTICES,
            parallel: true,
            min_parallel_faces: DEFAULT_MIN_PARALLEL_FACES,
        }
    }
}

impl MedianSplitPartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(max_unique_vertices: usize, parallel: bool) -> Self {
        Self {
            max_unique_vertices,
            parallel,
            ..Self::default()
        }
    }

    pub fn with_max_unique_vertices(mut self, max_unique_vertices: usize) -> Self {
        self.max_unique_vertices = max_unique_vertices;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_parallel_faces(mut self, min_parallel_faces: usize) -> Self {
        self.min_parallel_faces = min_parallel_faces;
        self
    }

    /// Reject budgets the recursion cannot satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.max_unique_vertices < MIN_UNIQUE_VERTICES {
            return Err(Error::InvalidConfig(format!(
                "max_unique_vertices must be at least {}, got {}",
                MIN_UNIQUE_VERTICES, self.max_unique_vertices
            )));
        }
        if self.min_parallel_faces == 0 {
            return Err(Error::InvalidConfig(
                "min_parallel_faces must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Partition `face_indices` starting at `axis` and `depth`.
    ///
    /// Leaves come out left-then-right: faces at or below the median first.
    /// Every id in `face_indices` must index both `faces` and `centroids`.
    pub fn partition_faces(
        &self,
        face_indices: Vec<usize>,
        faces: &[[usize; 3]],
        centroids: &CentroidTable,
        axis: Axis,
        depth: u32,
    ) -> Result<Vec<FaceIndexSet>> {
        self.validate()?;
        if centroids.len() != faces.len() {
            return Err(Error::BufferLengthMismatch {
                buffer: "centroids",
                expected: faces.len(),
                actual: centroids.len(),
            });
        }
        if let Some(&face) = face_indices.iter().find(|&&f| f >= faces.len()) {
            return Err(Error::FaceOutOfRange {
                face,
                face_count: faces.len(),
            });
        }
        if face_indices.is_empty() {
            return Ok(Vec::new());
        }

        let splitter = Splitter {
            faces,
            centroids,
            limit: self.max_unique_vertices,
        };

        let leaves = if self.parallel {
            splitter.run_forked(face_indices, axis, depth, 0, self.min_parallel_faces)
        } else {
            let mut leaves = Vec::new();
            splitter.run_stack(face_indices, axis, depth, &mut leaves);
            leaves
        };
        Ok(leaves)
    }
}

impl MeshPartitioner for MedianSplitPartitioner {
    fn partition(&self, mesh: &TriangleMesh) -> Result<Vec<FaceIndexSet>> {
        self.validate()?;
        mesh.validate()?;

        let centroids = CentroidTable::from_mesh(mesh);
        let leaves = self.partition_faces(
            (0..mesh.face_count()).collect(),
            &mesh.faces,
            &centroids,
            Axis::X,
            0,
        )?;

        info!(
            "Partitioned {} faces into {} chunks (limit {} vertices)",
            mesh.face_count(),
            leaves.len(),
            self.max_unique_vertices
        );
        Ok(leaves)
    }
}

enum Split {
    Leaf(FaceIndexSet),
    Branch { left: Vec<usize>, right: Vec<usize> },
}

struct Splitter<'a> {
    faces: &'a [[usize; 3]],
    centroids: &'a CentroidTable,
    limit: usize,
}

impl Splitter<'_> {
    fn split(&self, face_indices: Vec<usize>, axis: Axis, depth: u32) -> Split {
        let unique_vertices = unique_vertex_count(self.faces, &face_indices);
        if unique_vertices <= self.limit {
            return Split::Leaf(FaceIndexSet {
                faces: face_indices,
                unique_vertices,
                depth,
            });
        }

        let mut coords: Vec<f32> = face_indices
            .iter()
            .map(|&f| axis.coord(self.centroids.get(f)))
            .collect();
        let Some(split_value) = median(&mut coords) else {
            return Split::Leaf(FaceIndexSet {
                faces: face_indices,
                unique_vertices,
                depth,
            });
        };

        let (right, left): (Vec<usize>, Vec<usize>) = face_indices
            .iter()
            .partition(|&&f| axis.coord(self.centroids.get(f)) > split_value);

        if left.is_empty() || right.is_empty() {
            debug!(
                "Median {} on {:?} does not separate {} faces at depth {}, bisecting by position",
                split_value,
                axis,
                face_indices.len(),
                depth
            );
            let mut left = face_indices;
            let right = left.split_off(left.len() / 2);
            return Split::Branch { left, right };
        }

        Split::Branch { left, right }
    }

    fn run_stack(&self, face_indices: Vec<usize>, axis: Axis, depth: u32, leaves: &mut Vec<FaceIndexSet>) {
        let mut stack = vec![(face_indices, axis, depth)];
        while let Some((set, axis, depth)) = stack.pop() {
            match self.split(set, axis, depth) {
                Split::Leaf(leaf) => leaves.push(leaf),
                Split::Branch { left, right } => {
                    // Right goes first so left is popped, and emitted, first.
                    stack.push((right, axis.next(), depth + 1));
                    stack.push((left, axis.next(), depth + 1));
                }
            }
        }
    }

    fn run_forked(
        &self,
        face_indices: Vec<usize>,
        axis: Axis,
        depth: u32,
        forks: u32,
        min_parallel_faces: usize,
    ) -> Vec<FaceIndexSet> {
        if face_indices.len() < min_parallel_faces || forks >= MAX_FORK_DEPTH {
            let mut leaves = Vec::new();
            self.run_stack(face_indices, axis, depth, &mut leaves);
            return leaves;
        }

        match self.split(face_indices, axis, depth) {
            Split::Leaf(leaf) => vec![leaf],
            Split::Branch { left, right } => {
                let next = axis.next();
                let (mut leaves, right_leaves) = rayon::join(
                    || self.run_forked(left, next, depth + 1, forks + 1, min_parallel_faces),
                    || self.run_forked(right, next, depth + 1, forks + 1, min_parallel_faces),
                );
                leaves.extend(right_leaves);
                leaves
            }
        }
    }
}
