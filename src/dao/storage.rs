use std::{error::Error, path::PathBuf};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by save stores regardless of where they write.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The save could not be encoded.
    #[error("failed to encode save: {message}")]
    Encode {
        /// Human readable context.
        message: String,
        #[source]
        /// Underlying encoder failure.
        source: Box<dyn Error + Send + Sync>,
    },
    /// The target could not be written.
    #[error("failed to write save to `{path}`")]
    Write {
        /// Destination of the failed write.
        path: PathBuf,
        #[source]
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

impl StorageError {
    /// Construct an encode error from any serializer failure.
    pub fn encode(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Encode {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
