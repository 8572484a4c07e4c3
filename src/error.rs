use thiserror::Error;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading datasets, reading settings or exporting.
///
/// Degenerate series (empty, zero variance) are never errors; the scorer
/// handles them as ordinary results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported file format: .{0}")]
    UnsupportedFormat(String),

    #[error("missing '{0}' column")]
    MissingColumn(String),

    #[error("invalid JSON layout: {0}")]
    InvalidLayout(String),

    #[error("invalid filter '{0}': expected COLUMN=VALUE")]
    InvalidSelector(String),

    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("point index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}
