use mailharvest_core::FetchError;
use thiserror::Error;

/// Errors from setting up the archive client.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

pub type HttpResult<T> = Result<T, HttpError>;

/// Classify a reqwest failure for `url`.
pub(crate) fn fetch_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = e.status() {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
