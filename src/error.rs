use std::path::PathBuf;
use thiserror::Error;

/// Startup failures. Anything that happens once probing has begun is folded
/// into the result model instead of surfacing here.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid target '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },

    #[error("target '{input}' expands to {size} addresses (limit {limit})")]
    TargetTooLarge {
        input: String,
        size: u128,
        limit: u128,
    },

    #[error("invalid port specification '{input}'")]
    InvalidPortSpec { input: String },

    #[error("could not create report file '{}': {source}", path.display())]
    ReportCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report entry: {0}")]
    Serialize(#[from] serde_json::Error),
}
