use chrono::{DateTime, Utc};

use crate::table::EventKind;

/// Errors raised while loading reference tables or answering a phase query.
#[derive(Debug, thiserror::Error)]
pub enum EphemerisError {
    #[error("Instant {instant} is outside table coverage ({start} .. {end}]")]
    OutOfRange {
        instant: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Malformed {table} table: {reason}")]
    MalformedTable { table: EventKind, reason: String },

    #[error("Table parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Failed to open table file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Memory mapping failed: {0}")]
    Mmap(std::io::Error),

    #[error("Bundled table is unusable: {0}")]
    Bundled(String),
}

pub type Result<T> = std::result::Result<T, EphemerisError>;

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Preferences file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
