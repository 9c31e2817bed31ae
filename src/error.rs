use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BackfillError {
    #[error("invalid assembly accession: {0}")]
    InvalidAccession(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read input corpus: {0}")]
    InputRead(String),

    #[error("failed to parse corpus record: {0}")]
    RecordParse(String),

    #[error("listing request failed: {0}")]
    ListingHttp(String),

    #[error("listing returned status {status}: {message}")]
    ListingStatus { status: u16, message: String },

    #[error("datasets tool invocation failed: {0}")]
    DatasetsTool(String),

    #[error("datasets tool timed out after {0} seconds")]
    DatasetsTimeout(u64),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("record is missing field: {0}")]
    MissingField(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
