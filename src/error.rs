use std::path::PathBuf;
use thiserror::Error;

/// The main error type for voc2tfrecord operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("No labels found in label map file {path}")]
    LabelMapEmpty { path: PathBuf },

    #[error("No XML annotation files found in {path}")]
    NoInput { path: PathBuf },

    #[error("No usable XML annotation files in {path}: all {skipped} file(s) failed to parse")]
    NoUsableInput { path: PathBuf, skipped: usize },

    #[error("Failed to parse VOC XML {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to read image {path}: {source}")]
    MissingImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open output file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record in {path} at byte {offset}: {message}")]
    CorruptRecord {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error("Failed to write report: {0}")]
    ReportWrite(#[from] serde_json::Error),
}
