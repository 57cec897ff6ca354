//! Error types for meshsplit

use thiserror::Error;

/// Main error type for meshsplit operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Buffer length mismatch for {buffer}: expected {expected}, got {actual}")]
    BufferLengthMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexIndexOutOfRange {
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("Face index {face} is out of range for a mesh with {face_count} faces")]
    FaceOutOfRange { face: usize, face_count: usize },

    #[error("Index {index} does not fit the target index width (max {max})")]
    IndexOverflow { index: usize, max: usize },

    #[error("Output capacity exceeded: {required} entries required, capacity is {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },
}

/// Result type alias for meshsplit operations
pub type Result<T> = std::result::Result<T, Error>;
