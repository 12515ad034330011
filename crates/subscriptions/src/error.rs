//! Error taxonomy for export and import runs

use std::path::PathBuf;

/// Progress could not be written to (or read from) stable storage
#[derive(Debug, thiserror::Error)]
#[error("progress storage unavailable at {}: {source}", path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Errors that end an export or import run unsuccessfully
///
/// Per-channel failures never surface here except when they make the run
/// unsafe to continue (storage loss, credential loss).
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Credentials could not be obtained before any remote call
    #[error("credential error: {0}")]
    Credential(String),

    /// Listing subscriptions failed at the transport level
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// A creation call failed in a way that makes further calls pointless
    #[error("remote call failed fatally for channel {channel}: {detail}")]
    RemoteFatal { channel: String, detail: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The source list is absent or unreadable
    #[error("cannot read source list {}: {source}", path.display())]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;
