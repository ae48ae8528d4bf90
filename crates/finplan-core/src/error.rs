use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the edges of the series engine (file loading, configuration).
///
/// The aggregation pipeline itself never fails: malformed records degrade to
/// "contributes nothing". Only the code that fetches records and reads
/// settings surfaces these.
#[derive(Error, Debug)]
pub enum FinplanError {
    /// A record file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A record file parsed as JSON but did not contain an array of records.
    #[error("Unsupported record layout in {0}: expected an array of objects")]
    RecordLayout(PathBuf),

    /// A string could not be interpreted as a `YYYY-MM` month key.
    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),

    /// A category profile name is not one of the built-in profiles.
    #[error("Unknown category profile: {0}")]
    UnknownCategory(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the finplan crates.
pub type Result<T> = std::result::Result<T, FinplanError>;
