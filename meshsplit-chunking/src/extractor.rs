//! Chunk extraction: turn a face subset into a self-contained sub-mesh

use crate::geometry::distinct_vertices;
use meshsplit_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use serde::{Deserialize, Serialize};

/// A locally re-indexed sub-mesh together with its vertex provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    /// Vertices, normals and faces renumbered to `0..global_vertices.len()`
    pub mesh: TriangleMesh,
    /// `global_vertices[local]` is the vertex id in the source mesh, ascending
    pub global_vertices: Vec<usize>,
}

impl SubMesh {
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.faces.is_empty()
    }
}

/// Extract the faces listed in `face_indices` into a compact sub-mesh.
///
/// Local vertex ids are assigned in ascending order of global id, and the
/// same mapping is applied to positions and normals. Faces keep the order of
/// `face_indices`. Only vertices referenced by those faces are copied.
pub fn extract(
    vertices: &[Point3f],
    normals: Option<&[Vector3f]>,
    faces: &[[usize; 3]],
    face_indices: &[usize],
) -> Result<SubMesh> {
    if let Some(normals) = normals {
        if normals.len() != vertices.len() {
            return Err(Error::BufferLengthMismatch {
                buffer: "normals",
                expected: vertices.len(),
                actual: normals.len(),
            });
        }
    }
    for &face in face_indices {
        let Some(corners) = faces.get(face) else {
            return Err(Error::FaceOutOfRange {
                face,
                face_count: faces.len(),
            });
        };
        if let Some(&vertex) = corners.iter().find(|&&v| v >= vertices.len()) {
            return Err(Error::VertexIndexOutOfRange {
                face,
                vertex,
                vertex_count: vertices.len(),
            });
        }
    }

    let global_vertices = distinct_vertices(faces, face_indices);
    let local_id = |global: usize| -> usize {
        // Every corner of a listed face is in `global_vertices`.
        global_vertices.binary_search(&global).unwrap_or_else(|i| i)
    };

    let local_faces: Vec<[usize; 3]> = face_indices
        .iter()
        .map(|&f| faces[f].map(local_id))
        .collect();
    let local_vertices: Vec<Point3f> = global_vertices.iter().map(|&g| vertices[g]).collect();

    let mut mesh = TriangleMesh::from_vertices_and_faces(local_vertices, local_faces);
    if let Some(normals) = normals {
        mesh.normals = Some(global_vertices.iter().map(|&g| normals[g]).collect());
    }

    Ok(SubMesh {
        mesh,
        global_vertices,
    })
}

/// Extract a face subset of `mesh`, carrying its normals when present.
pub fn extract_chunk(mesh: &TriangleMesh, face_indices: &[usize]) -> Result<SubMesh> {
    extract(
        &mesh.vertices,
        mesh.normals.as_deref(),
        &mesh.faces,
        face_indices,
    )
}
