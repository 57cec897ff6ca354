//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional per-vertex normals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Build a mesh from the flat buffers a geometry loader hands over.
    ///
    /// `positions` and `normals` are packed `xyz` triples and `indices` packed
    /// triangle corners. An empty `normals` slice means the mesh has no normals.
    /// Any malformed buffer is rejected before a mesh is produced.
    pub fn from_flat_buffers(positions: &[f32], normals: &[f32], indices: &[u32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "Position buffer length {} is not a multiple of 3",
                positions.len()
            )));
        }
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(Error::BufferLengthMismatch {
                buffer: "normals",
                expected: positions.len(),
                actual: normals.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "Index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }

        let vertices: Vec<Point3f> = positions
            .chunks_exact(3)
            .map(|p| Point3f::new(p[0], p[1], p[2]))
            .collect();
        let normals = if normals.is_empty() {
            None
        } else {
            Some(
                normals
                    .chunks_exact(3)
                    .map(|n| Vector3f::new(n[0], n[1], n[2]))
                    .collect(),
            )
        };
        let faces: Vec<[usize; 3]> = indices
            .chunks_exact(3)
            .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
            .collect();

        let mesh = Self { vertices, faces, normals };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Set vertex normals; the buffer must be index-aligned with the vertices
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) -> Result<()> {
        if normals.len() != self.vertices.len() {
            return Err(Error::BufferLengthMismatch {
                buffer: "normals",
                expected: self.vertices.len(),
                actual: normals.len(),
            });
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Builder-style variant of [`TriangleMesh::set_normals`]
    pub fn with_normals(mut self, normals: Vec<Vector3f>) -> Result<Self> {
        self.set_normals(normals)?;
        Ok(self)
    }

    /// Check buffer alignment and that every face corner names an existing vertex
    pub fn validate(&self) -> Result<()> {
        if let Some(normals) = &self.normals {
            if normals.len() != self.vertices.len() {
                return Err(Error::BufferLengthMismatch {
                    buffer: "normals",
                    expected: self.vertices.len(),
                    actual: normals.len(),
                });
            }
        }

        let vertex_count = self.vertices.len();
        for (face, corners) in self.faces.iter().enumerate() {
            if let Some(&vertex) = corners.iter().find(|&&v| v >= vertex_count) {
                return Err(Error::VertexIndexOutOfRange {
                    face,
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Vertex positions as packed `xyz` floats
    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
    }

    /// Vertex normals as packed `xyz` floats, if present
    pub fn normals_flat(&self) -> Option<Vec<f32>> {
        self.normals
            .as_ref()
            .map(|normals| normals.iter().flat_map(|n| [n.x, n.y, n.z]).collect())
    }

    /// Triangle corners as a 32-bit index buffer
    pub fn indices_u32(&self) -> Result<Vec<u32>> {
        self.indices_with_width(u32::MAX as usize, |i| i as u32)
    }

    /// Triangle corners as a 16-bit index buffer
    pub fn indices_u16(&self) -> Result<Vec<u16>> {
        self.indices_with_width(u16::MAX as usize, |i| i as u16)
    }

    fn indices_with_width<T>(&self, max: usize, narrow: impl Fn(usize) -> T) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.faces.len() * 3);
        for &index in self.faces.iter().flatten() {
            if index > max {
                return Err(Error::IndexOverflow { index, max });
            }
            out.push(narrow(index));
        }
        Ok(out)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
