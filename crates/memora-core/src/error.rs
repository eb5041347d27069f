use thiserror::Error;

/// Top-level error type for Memora.
#[derive(Error, Debug)]
pub enum MemoraError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid {kind}: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("Invalid timestamp (expected RFC 3339): {0}")]
    InvalidTimestamp(String),
}
