use std::future::Future;

use mailharvest_core::{ArchiveSettings, ArchiveSource, FetchError};
use tracing::debug;

use crate::error::{fetch_error, HttpError, HttpResult};

/// Archive reached over HTTP(S).
pub struct HttpArchive {
    client: reqwest::Client,
    settings: ArchiveSettings,
}

impl HttpArchive {
    pub fn new(settings: ArchiveSettings) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .user_agent(concat!("mailharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }
}

impl ArchiveSource for HttpArchive {
    fn url_for(&self, id: i64) -> String {
        self.settings.url_for(id)
    }

    fn fetch(&self, id: i64) -> impl Future<Output = Result<String, FetchError>> + Send {
        let url = self.url_for(id);
        let client = self.client.clone();

        async move {
            debug!(url = %url, "Requesting message");

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| fetch_error(&url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| fetch_error(&url, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response on a local port and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/list/", addr)
    }

    #[test]
    fn test_url_for() {
        let settings = ArchiveSettings::new("http://mbox.dr-chuck.net/sakai.devel").unwrap();
        let archive = HttpArchive::new(settings).unwrap();
        assert_eq!(
            archive.url_for(41),
            "http://mbox.dr-chuck.net/sakai.devel/41/42"
        );
    }

    #[test]
    fn test_settings_are_kept() {
        let settings = ArchiveSettings::new("https://archive.example.org/list")
            .unwrap()
            .timeout(Duration::from_secs(7))
            .accept_invalid_certs(false);
        let archive = HttpArchive::new(settings).unwrap();

        assert_eq!(archive.settings().base_url.as_str(), "https://archive.example.org/list/");
        assert_eq!(archive.settings().timeout, Duration::from_secs(7));
        assert!(!archive.settings().accept_invalid_certs);
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let base = serve_once("200 OK", "From a@b.org Fri Jan  4 18:10:48 2008\n\nbody").await;
        let archive = HttpArchive::new(ArchiveSettings::new(&base).unwrap()).unwrap();

        let text = archive.fetch(1).await.unwrap();
        assert!(text.starts_with("From "));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let base = serve_once("404 Not Found", "missing").await;
        let archive = HttpArchive::new(ArchiveSettings::new(&base).unwrap()).unwrap();

        let err = archive.fetch(3).await.unwrap_err();
        match err {
            FetchError::Status { url, status } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/list/3/4"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let settings = ArchiveSettings::new(&format!("http://{}/", addr))
            .unwrap()
            .timeout(Duration::from_millis(200));
        let archive = HttpArchive::new(settings).unwrap();

        let err = archive.fetch(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let archive =
            HttpArchive::new(ArchiveSettings::new(&format!("http://{}/", addr)).unwrap()).unwrap();

        let err = archive.fetch(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "got {:?}", err);
    }
}
