use std::path::PathBuf;
use thiserror::Error;

/// 内容获取错误
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("content API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content API returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("failed to decode content API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid content API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("content API is not configured: {message}")]
    Config {
        message: String,
    },

    #[error("failed to load fixtures from {}: {message}", path.display())]
    Fixture {
        path: PathBuf,
        message: String,
    },

    #[error("query '{0}' is not supported by this content source")]
    UnsupportedQuery(String),
}
