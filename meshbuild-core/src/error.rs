//! Error types for meshbuild

use thiserror::Error;

/// Main error type for meshbuild operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),
    
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A triangle insertion would give an edge a third adjacent triangle.
    #[error("edge ({v0}, {v1}) already has two adjacent triangles")]
    NonManifoldEdge {
        v0: usize,
        v1: usize,
    },

    /// A triangle's edge could not be found after insertion.
    #[error("triangle edge ({v0}, {v1}) is not registered")]
    MissingEdge {
        v0: usize,
        v1: usize,
    },
}

/// Result type alias for meshbuild operations
pub type Result<T> = std::result::Result<T, Error>;
