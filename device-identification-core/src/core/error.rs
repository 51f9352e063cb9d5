//! Error types for the device identification library.

use thiserror::Error;

/// The digest collaborator could not run on this host.
#[derive(Debug, Error)]
#[error("Hash algorithm {algorithm} is not available: {reason}")]
pub struct HashError {
    pub algorithm: &'static str,
    pub reason: String,
}

/// All errors that can occur within the device identification library.
#[derive(Debug, Error)]
pub enum DeviceIdError {
    /// The Android ID is a known non-unique value and the caller did not opt to ignore it.
    #[error("The device suffers from the Android ID bug - its ID is the emulator ID : {0}")]
    NonUniqueIdentifier(String),

    /// No identifier source produced a usable value.
    #[error("Could not retrieve a device ID")]
    IdentifierUnavailable,

    /// The digest of the collected identifiers could not be computed.
    #[error("Could not retrieve a device ID: {0}")]
    HashingUnavailable(#[from] HashError),

    /// A preference namespace cannot be used as a file name.
    #[error("Invalid preference namespace: {0:?}")]
    InvalidNamespace(String),

    /// A SQLite operation in the preference store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`DeviceIdError`].
pub type Result<T> = std::result::Result<T, DeviceIdError>;

impl DeviceIdError {
    /// True when no identifier could be produced, whatever the cause.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::IdentifierUnavailable | Self::HashingUnavailable(_))
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NonUniqueIdentifier(_) => {
                "This device reports a shared Android ID and cannot be told apart".to_string()
            }
            Self::IdentifierUnavailable | Self::HashingUnavailable(_) => {
                "Device identifier is not available".to_string()
            }
            Self::InvalidNamespace(name) => format!("Invalid preference name: {name}"),
            Self::Storage(e) => format!("Failed to save preferences: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Configuration format error: {e}"),
        }
    }
}
