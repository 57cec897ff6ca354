//! Vertex-bounded mesh chunking
//!
//! This crate splits one large triangle mesh into sub-meshes that each
//! reference a bounded number of distinct vertices:
//! - Median-split partitioning of faces by centroid, alternating axes
//! - Extraction of a face subset into a compact, locally indexed sub-mesh
//! - An end-to-end pipeline producing named chunks and a summary report
//! - Block-anchored delta packing of quantized chunk positions

pub mod geometry;
pub mod partitioner;
pub mod extractor;
pub mod pipeline;
pub mod repack;

pub use geometry::*;
pub use partitioner::*;
pub use extractor::*;
pub use pipeline::*;
pub use repack::*;

use meshsplit_core::{TriangleMesh, Result};

/// Split a mesh into face subsets
pub trait MeshPartitioner {
    /// Partition every face of `mesh`; the returned sets are disjoint and cover all faces
    fn partition(&self, mesh: &TriangleMesh) -> Result<Vec<FaceIndexSet>>;
}
