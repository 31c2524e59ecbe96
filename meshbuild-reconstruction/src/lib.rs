//! # Meshbuild Reconstruction
//!
//! Ball pivoting surface reconstruction for oriented point clouds.
//!
//! A ball of a given radius is dropped onto the cloud until it rests on three
//! points (a seed triangle), then rolled around the edges of the growing mesh,
//! each time stopping on the first point it touches. Larger radii can be run
//! afterwards to close holes left by smaller ones.

pub mod geometry;
pub mod spatial_index;
pub mod mesh_graph;
pub mod seed;
pub mod pivot;
pub mod ball_pivoting;
pub mod progress;
pub mod audit;

// Re-export commonly used items
pub use ball_pivoting::*;
pub use mesh_graph::{Ball, EdgeId, EdgeState, MeshGraph, TriangleId, VertexId, VertexState};
pub use spatial_index::{CellKey, SpatialIndex};
pub use progress::Progress;
pub use audit::{AuditSummary, TopologyReport};
