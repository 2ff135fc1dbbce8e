use std::path::PathBuf;

use thiserror::Error;

/// Persistence failures. Reported beside a campaign result, never instead of it.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading, writing or renaming the history file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory state could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
