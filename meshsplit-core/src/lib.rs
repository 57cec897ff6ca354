//! Core data structures and traits for meshsplit
//!
//! This crate provides the mesh data model shared by the chunking pipeline:
//! point and vector types, the indexed triangle mesh with its flat-buffer
//! import and export helpers, and the common error type.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
