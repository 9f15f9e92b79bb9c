use thiserror::Error;
use zip::result::ZipError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum XlsxStreamError {
    #[error("invalid row source: {0}")]
    InvalidInput(String),

    #[error("row source failed: {0}")]
    Source(#[source] BoxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid style configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {0} exceeds the worksheet row limit")]
    RowLimit(u32),

    #[error("row has {0} cells, more than the worksheet column limit")]
    ColumnLimit(usize),

    #[error("writer already finalized")]
    Finalized,
}
