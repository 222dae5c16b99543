//! Buffer pool errors.

use thiserror::Error;

use crate::disk::IoError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum BufferError {
    /// No frame available: the free list is empty and every resident
    /// page is pinned.
    #[error("no frame available, all pages are pinned")]
    PoolExhausted,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Disk I/O failure, fatal to the enclosing operation.
    #[error("disk I/O error: {0}")]
    Disk(#[from] IoError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a transient error that can be retried
    /// (typically after unpinning some pages).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(BufferError::PoolExhausted.is_retryable());
        assert!(!BufferError::config("bad").is_retryable());

        let io = IoError::short_read(10, 5);
        assert!(!BufferError::from(io).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = BufferError::config("pool_size must be > 0");
        assert!(err.to_string().contains("pool_size"));
    }
}
