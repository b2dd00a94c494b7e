use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),

    /// The news API answered with a non-success status.
    #[error("News API error: server responded with HTTP {0}")]
    NewsApi(String),

    /// An article cannot be persisted without a URL to key it by.
    #[error("Article URL cannot be empty when saving to the database")]
    MissingUrl,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True for failures that never reached the server (connect, DNS, timeout).
    pub fn is_transport(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}
