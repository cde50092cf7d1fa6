//! Error types for I/O operations

use thiserror::Error;

/// Format-level errors raised while reading or writing files.
///
/// These convert into [`glacierviz_core::Error`]: parse and format problems
/// become `InvalidData`, write failures become `Io`.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Write error: {message}")]
    WriteError { message: String },
}

impl From<IoError> for glacierviz_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::WriteError { .. } => glacierviz_core::Error::Io(std::io::Error::other(e.to_string())),
            _ => glacierviz_core::Error::InvalidData(e.to_string()),
        }
    }
}
