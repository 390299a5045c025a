//! Error types for the rebalance planner.
//!
//! Engine functions degrade silently on malformed numeric input (positions
//! are skipped, not errored); these variants cover the I/O boundary and the
//! one loud failure, missing allocation data.

use std::path::PathBuf;

/// All errors that can occur during planner operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("failed to read snapshot file {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse snapshot JSON: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    #[error("allocation mode '{mode}' requires {missing:?}, absent for {tickers:?}")]
    MissingAllocationData {
        mode: String,
        missing: Vec<String>,
        tickers: Vec<String>,
    },

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
