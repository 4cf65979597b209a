use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure, non-2xx status or a non-HTML response.
    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// An archived page or file that should exist does not.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The markup no longer matches what the extractors expect.
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn extraction(msg: impl Into<String>) -> Self {
        Error::Extraction(msg.into())
    }
}
