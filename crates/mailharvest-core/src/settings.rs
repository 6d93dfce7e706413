use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Base location of the reference archive.
pub const DEFAULT_BASE_URL: &str = "http://mbox.dr-chuck.net/sakai.devel/";

/// How the archive is reached.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// Base location; message `n` lives at `<base>/<n>/<n+1>`.
    pub base_url: Url,
    /// Bound on a single retrieval.
    pub timeout: Duration,
    /// Skip certificate validation. The reference archive needs this.
    pub accept_invalid_certs: bool,
}

impl ArchiveSettings {
    /// Build settings from a base URL string with default timeout and cert policy.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Retrieval address for the message at `id`.
    pub fn url_for(&self, id: i64) -> String {
        archive_url(&self.base_url, id)
    }
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

/// Parse a base URL, normalizing it to end with a slash so ids join as path segments.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |message: String| Error::InvalidUrl {
        url: raw.to_string(),
        message,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be used as a base".into()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Join `id` and `id + 1` onto the base as path segments.
pub fn archive_url(base: &Url, id: i64) -> String {
    format!("{}{}/{}", base.as_str(), id, id + 1)
}

/// Commit, throttle and breaker settings for the harvest loop.
#[derive(Debug, Clone)]
pub struct HarvestPolicy {
    /// Commit the store transaction after this many stored messages.
    pub commit_every: u64,
    /// Pause after this many stored messages.
    pub pause_every: u64,
    /// Length of the politeness pause.
    pub pause: Duration,
    /// Consecutive failures tolerated before the run is aborted.
    pub max_consecutive_failures: u32,
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            commit_every: 50,
            pause_every: 100,
            pause: Duration::from_secs(1),
            max_consecutive_failures: 5,
        }
    }
}

impl HarvestPolicy {
    pub fn should_commit(&self, stored: u64) -> bool {
        self.commit_every > 0 && stored > 0 && stored % self.commit_every == 0
    }

    pub fn should_pause(&self, stored: u64) -> bool {
        self.pause_every > 0 && stored > 0 && stored % self.pause_every == 0 && !self.pause.is_zero()
    }
}
