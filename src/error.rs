//! Pipeline error taxonomy and user-facing message formatting.
//!
//! Uses typed error matching (PolarsError variants, io::ErrorKind) rather than
//! string parsing to produce actionable, implementation-agnostic messages.

use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source could not be fetched or parsed. Recoverable: callers degrade
    /// to an empty (optionally pre-shaped) table and a warning.
    #[error("source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// The join key is missing after alias resolution. Fatal to the current
    /// combination attempt; carries both column lists for diagnosis.
    #[error(
        "join key '{key}' not found. left columns: [{}]; right columns: [{}]",
        left.join(", "),
        right.join(", ")
    )]
    SchemaMismatch {
        key: String,
        left: Vec<String>,
        right: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// True when the pipeline may proceed with a placeholder table.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::SourceUnavailable { .. })
    }
}

/// Format a PipelineError as a user-facing message, unwrapping known
/// underlying error types by variant.
pub fn user_message(err: &PipelineError) -> String {
    match err {
        PipelineError::Polars(pe) => user_message_from_polars(pe),
        PipelineError::Io(ioe) => user_message_from_io(ioe),
        other => other.to_string(),
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check spelling and that the column exists in the source.",
            msg
        ),
        PE::Duplicate(msg) => format!(
            "Duplicate column in result: {}. Positional column concatenation requires distinct column names on both sides.",
            msg
        ),
        PE::IO { error, .. } => user_message_from_io(error.as_ref()),
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::ComputeError(msg) => msg.to_string(),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::ConnectionRefused => "Connection refused.".to_string(),
        ErrorKind::ConnectionReset => "Connection reset.".to_string(),
        ErrorKind::TimedOut => "Connection timed out.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => err.to_string(),
    }
}
