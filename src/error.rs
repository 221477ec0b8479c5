//! Error types for the file vault.

use thiserror::Error;

/// Common error type for the file vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The persistence engine could not be opened or migrated.
    ///
    /// This is fatal to the session; the application has to be restarted.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A single write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A single read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The thumbnail drawing surface could not be created.
    #[error("render surface unavailable: {0}")]
    RenderSurfaceUnavailable(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Whether the error ends the session (only an unavailable store does).
    pub fn is_fatal(&self) -> bool {
        matches!(self, VaultError::StorageUnavailable(_))
    }

    /// Whether the error was raised by input validation before reaching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, VaultError::Validation(_))
    }

    /// Text for the dismissible banner shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            VaultError::StorageUnavailable(_) => {
                "Failed to initialize the application. Please reload.".to_string()
            }
            VaultError::WriteFailed(_) => "Failed to save your changes. Please try again.".to_string(),
            VaultError::ReadFailed(_) => "Failed to load your files. Please try again.".to_string(),
            VaultError::NotFound(what) => format!("The {what} no longer exists."),
            VaultError::RenderSurfaceUnavailable(_) => "Preview unavailable.".to_string(),
            VaultError::Validation(msg) => msg.clone(),
            VaultError::Config(msg) => format!("Invalid configuration: {msg}"),
            VaultError::Io(_) => "Could not read the file from disk.".to_string(),
        }
    }
}

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = VaultError::NotFound("folder".to_string());
        assert_eq!(err.to_string(), "folder not found");
    }

    #[test]
    fn test_validation_error_display() {
        let err = VaultError::Validation("folder name is empty".to_string());
        assert_eq!(err.to_string(), "validation error: folder name is empty");
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "folder name is empty");
    }

    #[test]
    fn test_only_storage_unavailable_is_fatal() {
        assert!(VaultError::StorageUnavailable("blocked".into()).is_fatal());
        assert!(!VaultError::WriteFailed("disk full".into()).is_fatal());
        assert!(!VaultError::ReadFailed("busy".into()).is_fatal());
        assert!(!VaultError::NotFound("folder".into()).is_fatal());
        assert!(!VaultError::RenderSurfaceUnavailable("zero size".into()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VaultError = io_err.into();
        assert!(matches!(err, VaultError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(VaultError::WriteFailed("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
