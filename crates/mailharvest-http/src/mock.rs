use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use mailharvest_core::{archive_url, ArchiveSettings, ArchiveSource, FetchError};

/// A mock archive for testing.
///
/// Serves registered pages; any other id answers 404.
#[derive(Clone, Default)]
pub struct MockArchive {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Pages by id.
    pages: HashMap<i64, String>,
    /// Every id requested, in order.
    requests: Vec<i64>,
    /// If set, every fetch fails with this transport error.
    fail_with: Option<String>,
}

impl MockArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock archive whose every fetch fails.
    pub fn failing(error_message: impl Into<String>) -> Self {
        let archive = Self::new();
        archive.state.lock().unwrap().fail_with = Some(error_message.into());
        archive
    }

    /// Register the document served for `id`.
    pub fn with_page(self, id: i64, text: impl Into<String>) -> Self {
        self.state.lock().unwrap().pages.insert(id, text.into());
        self
    }

    /// Ids requested so far.
    pub fn requests(&self) -> Vec<i64> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl ArchiveSource for MockArchive {
    fn url_for(&self, id: i64) -> String {
        archive_url(&ArchiveSettings::default().base_url, id)
    }

    fn fetch(&self, id: i64) -> impl Future<Output = Result<String, FetchError>> + Send {
        let state = self.state.clone();
        let url = self.url_for(id);
        async move {
            let mut state = state.lock().unwrap();
            state.requests.push(id);

            if let Some(ref error) = state.fail_with {
                return Err(FetchError::Transport {
                    url,
                    message: error.clone(),
                });
            }

            state
                .pages
                .get(&id)
                .cloned()
                .ok_or(FetchError::Status { url, status: 404 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_archive_serves_pages() {
        let archive = MockArchive::new().with_page(1, "From a@b\n\nbody");

        assert_eq!(archive.fetch(1).await.unwrap(), "From a@b\n\nbody");
        assert!(matches!(
            archive.fetch(2).await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(archive.requests(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_mock_archive_failing() {
        let archive = MockArchive::failing("simulated failure").with_page(1, "From a@b\n\nbody");

        let result = archive.fetch(1).await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
        assert_eq!(archive.request_count(), 1);
    }

    #[test]
    fn test_mock_archive_url_uses_default_base() {
        let archive = MockArchive::new();
        assert!(archive.url_for(5).ends_with("/sakai.devel/5/6"));
    }
}
