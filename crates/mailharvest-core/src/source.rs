use std::future::Future;

use crate::error::FetchError;

/// Where raw message documents come from.
pub trait ArchiveSource: Send + Sync {
    /// Retrieval address for the message at `id`, used in logs.
    fn url_for(&self, id: i64) -> String;

    /// Retrieve the raw document for `id`.
    fn fetch(&self, id: i64) -> impl Future<Output = Result<String, FetchError>> + Send;
}
