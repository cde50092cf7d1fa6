//! Error types for glacierviz

use thiserror::Error;

/// Main error type for glacierviz operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shape mismatch in snapshot {snapshot}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        snapshot: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Time index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No glacier series is bound to the scene")]
    NotBound,

    #[error("Visualization error: {0}")]
    Visualization(String),
}

/// Result type alias for glacierviz operations
pub type Result<T> = std::result::Result<T, Error>;
