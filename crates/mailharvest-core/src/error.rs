use thiserror::Error;

/// Errors that can occur in mailharvest-core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not a recognized message: missing 'From ' marker")]
    NotAMessage,

    #[error("could not find break between headers and body")]
    MissingHeaderBreak,

    #[error("unparseable date: {0}")]
    UnparseableDate(String),

    #[error("invalid archive url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Whether the harvest loop may skip the message and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotAMessage | Error::MissingHeaderBreak | Error::UnparseableDate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from retrieving a document from the archive.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_recoverable() {
        assert!(Error::NotAMessage.is_recoverable());
        assert!(Error::MissingHeaderBreak.is_recoverable());
        assert!(Error::UnparseableDate("garbage".into()).is_recoverable());
        assert!(!Error::Store("connection reset".into()).is_recoverable());
    }

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::Status {
            url: "http://archive/1/2".into(),
            status: 404,
        };
        assert_eq!(err.url(), "http://archive/1/2");
        assert_eq!(err.to_string(), "unexpected status 404 from http://archive/1/2");
    }
}
