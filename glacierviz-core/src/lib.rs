//! Core data structures for glacierviz
//!
//! This crate provides the fundamental types shared by the glacierviz crates:
//! grid georeferencing, glacier snapshots and series, triangle meshes, the
//! grid-to-mesh conversion and the common error type.

pub mod point;
pub mod grid;
pub mod series;
pub mod mesh;
pub mod surface;
pub mod traits;
pub mod error;

pub use point::*;
pub use grid::*;
pub use series::*;
pub use mesh::*;
pub use surface::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};

/// Re-export the grid container
pub use ndarray::Array2;

// Type aliases for easier imports
pub type Point = Point3f;
pub type Mesh = TriangleMesh;
