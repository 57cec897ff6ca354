//! End-to-end chunking: partition a mesh, then extract every leaf
//!
//! This is the entry point an export sink drives. It validates the input once,
//! plans the partition with [`MedianSplitPartitioner`], and materializes each
//! leaf as a named, locally indexed [`Chunk`].

use crate::extractor::{extract_chunk, SubMesh};
use crate::partitioner::{FaceIndexSet, MedianSplitPartitioner, DEFAULT_MAX_UNIQUE_VERTICES};
use crate::MeshPartitioner;
use log::{debug, info};
use meshsplit_core::{Bounded, Point3f, Result, TriangleMesh};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Chunking pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum distinct vertices per chunk (at least 3)
    pub max_unique_vertices: usize,
    /// Use the rayon pool for partitioning and extraction
    pub parallel: bool,
    /// Face sets smaller than this are split on the calling thread
    pub min_parallel_faces: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let partitioner = MedianSplitPartitioner::default();
        Self {
            max_unique_vertices: DEFAULT_MAX_UNIQUE_VERTICES,
            parallel: partitioner.parallel,
            min_parallel_faces: partitioner.min_parallel_faces,
        }
    }
}

impl ChunkingConfig {
    pub fn new() -> Self {
        Self::default()
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

    pub fn partitioner(&self) -> MedianSplitPartitioner {
        MedianSplitPartitioner::with_params(self.max_unique_vertices, self.parallel)
            .with_min_parallel_faces(self.min_parallel_faces)
    }

    pub fn validate(&self) -> Result<()> {
        self.partitioner().validate()
    }
}

/// One output chunk, ready for an export sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the pipeline output
    pub index: usize,
    /// Global face ids this chunk was built from
    pub source: FaceIndexSet,
    /// The re-indexed geometry
    pub geometry: SubMesh,
}

impl Chunk {
    /// Display name in the `Part_0000` scheme
    pub fn name(&self) -> String {
        format!("Part_{:04}", self.index)
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.geometry.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn face_count(&self) -> usize {
        self.geometry.face_count()
    }

    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        self.geometry.mesh.bounding_box()
    }
}

/// Summary of a chunking run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkingReport {
    pub chunk_count: usize,
    pub face_count: usize,
    /// Distinct source vertices referenced by at least one face
    pub referenced_vertices: usize,
    /// Sum of per-chunk vertex counts; shared border vertices count once per chunk
    pub emitted_vertices: usize,
    pub min_chunk_vertices: usize,
    pub max_chunk_vertices: usize,
}

impl ChunkingReport {
    /// Summarize `chunks` cut from `mesh`. Face corners past the end of the
    /// vertex buffer are not counted as referenced.
    pub fn from_chunks(mesh: &TriangleMesh, chunks: &[Chunk]) -> Self {
        let mut referenced = vec![false; mesh.vertex_count()];
        for &v in mesh.faces.iter().flatten() {
            if let Some(r) = referenced.get_mut(v) {
                *r = true;
            }
        }

        let sizes = chunks.iter().map(Chunk::vertex_count);
        Self {
            chunk_count: chunks.len(),
            face_count: chunks.iter().map(Chunk::face_count).sum(),
            referenced_vertices: referenced.iter().filter(|&&r| r).count(),
            emitted_vertices: sizes.clone().sum(),
            min_chunk_vertices: sizes.clone().min().unwrap_or(0),
            max_chunk_vertices: sizes.max().unwrap_or(0),
        }
    }

    /// Emitted over referenced vertices; 1.0 means no vertex was duplicated
    pub fn duplication_ratio(&self) -> f64 {
        if self.referenced_vertices == 0 {
            return 1.0;
        }
        self.emitted_vertices as f64 / self.referenced_vertices as f64
    }
}

/// Splits a mesh into vertex-bounded chunks
#[derive(Debug, Clone, Default)]
pub struct MeshChunker {
    pub config: ChunkingConfig,
}

impl MeshChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Compute the partition only, without materializing any geometry
    pub fn plan(&self, mesh: &TriangleMesh) -> Result<Vec<FaceIndexSet>> {
        self.config.validate()?;
        info!(
            "Computing partitions for {} faces / {} vertices",
            mesh.face_count(),
            mesh.vertex_count()
        );
        self.config.partitioner().partition(mesh)
    }

    /// Partition `mesh` and extract every leaf, in partition order
    pub fn chunk(&self, mesh: &TriangleMesh) -> Result<Vec<Chunk>> {
        let plan = self.plan(mesh)?;
        info!("Generating {} parts", plan.len());

        let build = |(index, source): (usize, FaceIndexSet)| -> Result<Chunk> {
            let geometry = extract_chunk(mesh, &source.faces)?;
            debug!(
                "Part_{:04}: {} faces, {} vertices",
                index,
                geometry.face_count(),
                geometry.vertex_count()
            );
            Ok(Chunk {
                index,
                source,
                geometry,
            })
        };

        if self.config.parallel {
            plan.into_par_iter().enumerate().map(build).collect()
        } else {
            plan.into_iter().enumerate().map(build).collect()
        }
    }

    /// Chunk `mesh` and summarize the result
    pub fn chunk_with_report(&self, mesh: &TriangleMesh) -> Result<(Vec<Chunk>, ChunkingReport)> {
        let chunks = self.chunk(mesh)?;
        let report = ChunkingReport::from_chunks(mesh, &chunks);
        info!(
            "Chunked into {} parts, {} -> {} vertices (x{:.3})",
            report.chunk_count,
            report.referenced_vertices,
            report.emitted_vertices,
            report.duplication_ratio()
        );
        Ok((chunks, report))
    }
}
