use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

pub type Result<T> = std::result::Result<T, ReportError>;
