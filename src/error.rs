//! Error types for raw-preview

use std::io;

/// Result type for raw-preview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes exposed at the API boundary
///
/// Callers are expected to treat every code as recoverable (typically by
/// falling back to an external extraction tool); none is fatal to the
/// host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    FileNotFound,
    UnsupportedFormat,
    NoPreviewsFound,
    CorruptedFile,
    Timeout,
    OutOfMemory,
    InvalidArgument,
}

impl ErrorCode {
    /// Canonical SCREAMING_SNAKE_CASE name of this code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorCode::NoPreviewsFound => "NO_PREVIEWS_FOUND",
            ErrorCode::CorruptedFile => "CORRUPTED_FILE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::OutOfMemory => "OUT_OF_MEMORY",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during preview extraction
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File missing or unreadable
    #[error("failed to open file {path}: {source}")]
    FileNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    /// I/O error outside of the open path
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No format detector matched the input
    #[error("unsupported or unrecognized RAW format")]
    UnsupportedFormat,

    /// Format recognized but no valid preview candidate was found
    #[error("no previews found in RAW file")]
    NoPreviewsFound,

    /// A referenced byte range is out of bounds or structurally
    /// inconsistent
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// Per-call time budget exhausted
    #[error("operation timed out during {phase}")]
    Timeout { phase: &'static str },

    /// File or buffer exceeds the configured memory budget
    #[error("input of {size} bytes exceeds memory limit of {max} bytes")]
    MemoryLimit { size: u64, max: u64 },

    /// Caller violated the API contract
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Map this error onto its boundary-facing code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::FileNotFound { .. } => ErrorCode::FileNotFound,
            Error::Io(_) => ErrorCode::FileNotFound,
            Error::UnsupportedFormat => ErrorCode::UnsupportedFormat,
            Error::NoPreviewsFound => ErrorCode::NoPreviewsFound,
            Error::CorruptedFile(_) => ErrorCode::CorruptedFile,
            Error::Timeout { .. } => ErrorCode::Timeout,
            Error::MemoryLimit { .. } => ErrorCode::OutOfMemory,
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
        }
    }

    /// Optional context (currently the offending file path, if any)
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::FileNotFound { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::UnsupportedFormat.code(), ErrorCode::UnsupportedFormat);
        assert_eq!(
            Error::CorruptedFile("x".into()).code().as_str(),
            "CORRUPTED_FILE"
        );
        assert_eq!(
            Error::MemoryLimit { size: 2, max: 1 }.code(),
            ErrorCode::OutOfMemory
        );
    }

    #[test]
    fn test_context() {
        let err = Error::FileNotFound {
            path: "/no/such.cr2".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.context(), Some("/no/such.cr2"));
        assert_eq!(Error::NoPreviewsFound.context(), None);
    }
}
