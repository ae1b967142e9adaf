use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the reporting toolkit.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delimited file could not be parsed at all (not a row-level problem;
    /// row-level problems are coerced or skipped).
    #[error("Failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// A required column header is absent from an input file.
    #[error("Missing column \"{column}\" in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// The expected input path does not exist.
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    /// No order report files were found under the given directory.
    #[error("No order report files found in {0}")]
    NoOrderFiles(PathBuf),

    /// The workbook writer failed.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// A JSON document could not be serialized.
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the toolkit crates.
pub type Result<T> = std::result::Result<T, ReportError>;
