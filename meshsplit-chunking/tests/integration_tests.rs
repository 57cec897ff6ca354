//! Integration tests for meshsplit-chunking
//!
//! These tests run the partitioner, the extractor and the pipeline together
//! and check the properties every chunking run must satisfy.

use meshsplit_chunking::*;
use meshsplit_core::{Point3f, TriangleMesh, Vector3f};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Create a closed UV sphere with per-vertex normals
fn create_uv_sphere(radius: f32, rings: usize, segments: usize) -> TriangleMesh {
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    for r in 0..=rings {
        let phi = std::f32::consts::PI * r as f32 / rings as f32;
        for s in 0..segments {
            let theta = 2.0 * std::f32::consts::PI * s as f32 / segments as f32;
            let n = Vector3f::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
            vertices.push(Point3f::from(n * radius));
            normals.push(n);
        }
    }
    let mut faces = Vec::new();
    for r in 0..rings {
        for s in 0..segments {
            let a = r * segments + s;
            let b = r * segments + (s + 1) % segments;
            let c = (r + 1) * segments + s;
            let d = (r + 1) * segments + (s + 1) % segments;
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
        .with_normals(normals)
        .unwrap()
}

/// Create a random triangle soup over a shared vertex pool
fn create_random_soup(seed: u64, vertex_count: usize, face_count: usize) -> TriangleMesh {
    let mut rng = StdRng::seed_from_u64(seed);
    let vertices: Vec<Point3f> = (0..vertex_count)
        .map(|_| {
            Point3f::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            )
        })
        .collect();
    let faces: Vec<[usize; 3]> = (0..face_count)
        .map(|_| {
            [
                rng.gen_range(0..vertex_count),
                rng.gen_range(0..vertex_count),
                rng.gen_range(0..vertex_count),
            ]
        })
        .collect();
    let normals = vec![Vector3f::y(); vertex_count];
    TriangleMesh::from_vertices_and_faces(vertices, faces)
        .with_normals(normals)
        .unwrap()
}

/// Every face lies on the same point: all centroids coincide
fn create_collapsed_mesh(face_count: usize) -> TriangleMesh {
    let vertices = vec![Point3f::new(2.0, -1.0, 0.5); face_count + 2];
    let faces = (0..face_count).map(|i| [i, i + 1, i + 2]).collect();
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

fn assert_disjoint_cover(leaves: &[FaceIndexSet], face_count: usize) {
    let mut seen = HashSet::new();
    for leaf in leaves {
        for &f in &leaf.faces {
            assert!(seen.insert(f), "face {} emitted twice", f);
        }
    }
    assert_eq!(seen.len(), face_count);
    assert!(seen.iter().all(|&f| f < face_count));
}

fn assert_chunk_valid(mesh: &TriangleMesh, chunk: &Chunk, limit: usize) {
    let local = chunk.mesh();
    assert!(local.vertex_count() <= limit);
    assert!(local.validate().is_ok());
    assert_eq!(local.face_count(), chunk.source.len());

    // Minimality: exactly the distinct referenced vertices
    let referenced: HashSet<usize> = chunk
        .source
        .faces
        .iter()
        .flat_map(|&f| mesh.faces[f])
        .collect();
    assert_eq!(local.vertex_count(), referenced.len());

    // Reconstruction: local triangles land on the same positions and normals
    for (local_face, &global_face) in local.faces.iter().zip(&chunk.source.faces) {
        for corner in 0..3 {
            let global_vertex = mesh.faces[global_face][corner];
            let local_vertex = local_face[corner];
            assert_eq!(chunk.geometry.global_vertices[local_vertex], global_vertex);
            assert_eq!(local.vertices[local_vertex], mesh.vertices[global_vertex]);
            if let (Some(ln), Some(gn)) = (&local.normals, &mesh.normals) {
                assert_eq!(ln[local_vertex], gn[global_vertex]);
            }
        }
    }
}

#[test]
fn test_four_triangles_six_vertices_budget_four() -> anyhow::Result<()> {
    let mesh = TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(2.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [1, 3, 2], [1, 4, 3], [4, 5, 3]],
    );
    let chunker = MeshChunker::new(
        ChunkingConfig::new()
            .with_max_unique_vertices(4)
            .with_parallel(false),
    );
    let chunks = chunker.chunk(&mesh)?;
    assert!(chunks.len() >= 2);

    let leaves: Vec<FaceIndexSet> = chunks.iter().map(|c| c.source.clone()).collect();
    assert_disjoint_cover(&leaves, 4);
    for chunk in &chunks {
        assert!(chunk.vertex_count() <= 4);
        assert!(chunk.mesh().faces.iter().flatten().all(|&i| i < chunk.vertex_count()));
        assert_chunk_valid(&mesh, chunk, 4);
    }
    Ok(())
}

#[test]
fn test_sphere_chunks_cover_and_respect_budget() -> anyhow::Result<()> {
    let mesh = create_uv_sphere(1.0, 40, 64);
    for limit in [3, 17, 100, 500] {
        let chunker = MeshChunker::new(ChunkingConfig::new().with_max_unique_vertices(limit));
        let chunks = chunker.chunk(&mesh)?;
        let leaves: Vec<FaceIndexSet> = chunks.iter().map(|c| c.source.clone()).collect();
        assert_disjoint_cover(&leaves, mesh.face_count());
        for chunk in &chunks {
            assert_chunk_valid(&mesh, chunk, limit);
        }
    }
    Ok(())
}

#[test]
fn test_random_soups() -> anyhow::Result<()> {
    for seed in 0..8 {
        let mesh = create_random_soup(seed, 400, 900);
        let limit = 50 + seed as usize * 20;
        let chunker = MeshChunker::new(ChunkingConfig::new().with_max_unique_vertices(limit));
        let chunks = chunker.chunk(&mesh)?;
        let leaves: Vec<FaceIndexSet> = chunks.iter().map(|c| c.source.clone()).collect();
        assert_disjoint_cover(&leaves, mesh.face_count());
        for chunk in &chunks {
            assert_chunk_valid(&mesh, chunk, limit);
        }
    }
    Ok(())
}

#[test]
fn test_deterministic_output() -> anyhow::Result<()> {
    let mesh = create_random_soup(42, 2_000, 5_000);
    let config = ChunkingConfig::new()
        .with_max_unique_vertices(256)
        .with_min_parallel_faces(64);
    let first = MeshChunker::new(config.clone()).chunk(&mesh)?;
    for _ in 0..3 {
        assert_eq!(MeshChunker::new(config.clone()).chunk(&mesh)?, first);
    }
    let sequential = MeshChunker::new(config.with_parallel(false)).chunk(&mesh)?;
    assert_eq!(sequential, first);
    Ok(())
}

#[test]
fn test_collapsed_mesh_terminates() -> anyhow::Result<()> {
    let mesh = create_collapsed_mesh(2_000);
    for parallel in [false, true] {
        let chunker = MeshChunker::new(
            ChunkingConfig::new()
                .with_max_unique_vertices(10)
                .with_parallel(parallel)
                .with_min_parallel_faces(32),
        );
        let chunks = chunker.chunk(&mesh)?;
        let leaves: Vec<FaceIndexSet> = chunks.iter().map(|c| c.source.clone()).collect();
        assert_disjoint_cover(&leaves, mesh.face_count());
        for chunk in &chunks {
            assert_chunk_valid(&mesh, chunk, 10);
        }
    }
    Ok(())
}

#[test]
fn test_flat_buffer_round_trip_through_chunks() -> anyhow::Result<()> {
    let sphere = create_uv_sphere(2.0, 12, 16);
    let positions = sphere.positions_flat();
    let normals = sphere.normals_flat().unwrap_or_default();
    let indices = sphere.indices_u32()?;

    let mesh = TriangleMesh::from_flat_buffers(&positions, &normals, &indices)?;
    assert_eq!(mesh, sphere);

    let chunks = MeshChunker::new(ChunkingConfig::new().with_max_unique_vertices(60)).chunk(&mesh)?;
    for chunk in &chunks {
        let local = chunk.mesh();
        let local_indices = local.indices_u16()?;
        assert_eq!(local_indices.len(), local.face_count() * 3);
        assert_eq!(local.positions_flat().len(), local.vertex_count() * 3);
        assert_eq!(local.normals_flat().map(|n| n.len()), Some(local.vertex_count() * 3));
    }
    Ok(())
}

#[test]
fn test_repack_chunk_positions() -> anyhow::Result<()> {
    let mesh = create_uv_sphere(5.0, 20, 24);
    let chunks = MeshChunker::new(ChunkingConfig::new().with_max_unique_vertices(120)).chunk(&mesh)?;

    for chunk in &chunks {
        let local = chunk.mesh();
        let quantized = quantize_positions(&local.vertices);
        let packed = DeltaPacker::new().pack(&quantized.positions)?;
        assert_eq!(packed.remap.len(), local.vertex_count());

        let mut indices = local.indices_u32()?;
        packed.remap_indices_u32(&mut indices)?;
        for (&packed_index, &original) in indices.iter().zip(local.faces.iter().flatten()) {
            let decoded = packed.decode(packed_index as usize).unwrap();
            assert_eq!(decoded, quantized.positions[original]);
        }
    }
    Ok(())
}

#[test]
fn test_invalid_inputs_fail_fast() {
    let err = TriangleMesh::from_flat_buffers(&[0.0; 9], &[], &[0, 1, 3]).unwrap_err();
    assert!(matches!(err, meshsplit_core::Error::VertexIndexOutOfRange { .. }));

    let mesh = create_uv_sphere(1.0, 4, 6);
    let err = MeshChunker::new(ChunkingConfig::new().with_max_unique_vertices(1))
        .chunk(&mesh)
        .unwrap_err();
    assert!(matches!(err, meshsplit_core::Error::InvalidConfig(_)));

    let err = extract_chunk(&mesh, &[mesh.face_count()]).unwrap_err();
    assert!(matches!(err, meshsplit_core::Error::FaceOutOfRange { .. }));
}
