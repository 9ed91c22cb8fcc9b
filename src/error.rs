//! Global error handling for repo-serializer
//!
//! Only run-level failures live here. Problems with a single entry during
//! traversal are recorded on the entry itself and never abort a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for serializer operations
#[derive(Error, Debug)]
pub enum SerializerError {
    /// Conflicting or malformed invocation
    #[error("{0}")]
    Usage(String),

    /// Repository root is missing or not a directory
    #[error("{} is not a valid directory", .0.display())]
    InvalidRoot(PathBuf),

    /// Destination could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid ignore pattern or .gitignore file
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SerializerError {
    /// Whether the error was raised before any traversal started
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::InvalidRoot(_))
    }
}

/// Specialized Result type for serializer operations
pub type Result<T> = std::result::Result<T, SerializerError>;

/// Creates a SerializerError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::SerializerError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}
