//! Core data structures for meshbuild
//! 
//! This crate provides the fundamental types shared by the meshbuild crates:
//! oriented points, point clouds, triangle meshes and the common error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use error::*;

