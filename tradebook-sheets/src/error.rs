use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sheets api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid sheets base url {0}")]
    InvalidBaseUrl(String),

    #[error("null {0} response")]
    NullResponse(&'static str),

    #[error("malformed {dataset} row {index}: {reason}")]
    MalformedRow {
        dataset: &'static str,
        index: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SheetsError>;
