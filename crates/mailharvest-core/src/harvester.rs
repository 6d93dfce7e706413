//! The resumable harvest loop.
//!
//! A [`Harvester`] owns the archive source, the store and the cursor. The
//! cursor is read from the store once by [`Harvester::resume`] and advanced in
//! memory afterwards. Each call to [`Harvester::run_batch`] spends a budget of
//! fetch attempts; ids the store already holds are skipped without spending it.

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::breaker::FailureBreaker;
use crate::error::Result;
use crate::parser::MessageParser;
use crate::settings::HarvestPolicy;
use crate::source::ArchiveSource;
use crate::store::MessageStore;
use crate::types::{HarvestStats, MessageRecord};

/// Characters of a rejected document included in the warning log.
const SNIPPET_CHARS: usize = 200;

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The budget was spent; the caller may ask for another batch.
    Exhausted,
    /// Shutdown was requested while fetching.
    Interrupted,
    /// Too many consecutive failures.
    Tripped,
}

impl BatchOutcome {
    /// Whether the whole run must stop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchOutcome::Exhausted)
    }
}

pub struct Harvester<S, M> {
    source: S,
    store: M,
    parser: MessageParser,
    policy: HarvestPolicy,
    breaker: FailureBreaker,
    shutdown: watch::Receiver<bool>,
    cursor: i64,
    /// Messages handed to the store, used for commit and pause intervals.
    processed: u64,
    stats: HarvestStats,
}

impl<S, M> Harvester<S, M>
where
    S: ArchiveSource,
    M: MessageStore,
{
    /// Create a harvester. Shutdown is requested by sending `true` on the
    /// channel that `shutdown` belongs to.
    pub fn new(source: S, store: M, policy: HarvestPolicy, shutdown: watch::Receiver<bool>) -> Self {
        let breaker = FailureBreaker::new(policy.max_consecutive_failures);
        Self {
            source,
            store,
            parser: MessageParser::default(),
            policy,
            breaker,
            shutdown,
            cursor: 0,
            processed: 0,
            stats: HarvestStats::default(),
        }
    }

    pub fn with_parser(mut self, parser: MessageParser) -> Self {
        self.parser = parser;
        self
    }

    /// Load the cursor from the highest stored id. A failing query starts from 0.
    pub async fn resume(&mut self) -> i64 {
        self.cursor = match self.store.max_id().await {
            Ok(max) => max.unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "Could not read highest stored id, starting from 0");
                0
            }
        };

        info!(cursor = self.cursor, next = self.cursor + 1, "Resuming harvest");
        self.cursor
    }

    /// Last id attempted (or the resume point if nothing was attempted yet).
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn stats(&self) -> HarvestStats {
        self.stats
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Spend `budget` fetch attempts.
    ///
    /// Recoverable failures are logged and skipped. Store errors propagate.
    /// The store is committed before returning, whatever the outcome.
    pub async fn run_batch(&mut self, budget: u64) -> Result<BatchOutcome> {
        let mut remaining = budget;

        while remaining > 0 {
            let id = self.cursor + 1;
            self.cursor = id;

            match self.store.contains(id).await {
                Ok(true) => {
                    debug!(id, "Already stored, skipping");
                    self.stats.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(id, error = %e, "Existence check failed, fetching anyway"),
            }

            remaining -= 1;
            let url = self.source.url_for(id);

            let fetched = if *self.shutdown.borrow() {
                None
            } else {
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut self.shutdown) => None,
                    result = self.source.fetch(id) => Some(result),
                }
            };

            let text = match fetched {
                None => {
                    info!(id, "Harvest interrupted");
                    self.store.commit().await?;
                    return Ok(BatchOutcome::Interrupted);
                }
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    warn!(url = %url, error = %e, "Unable to retrieve page");
                    if self.record_failure() {
                        self.store.commit().await?;
                        return Ok(BatchOutcome::Tripped);
                    }
                    continue;
                }
            };

            self.stats.fetched += 1;
            info!(url = %url, len = text.len(), "Fetched");

            let message = match self.parser.parse(&text) {
                Ok(message) => message,
                Err(e) => {
                    warn!(url = %url, error = %e, snippet = snippet(&text), "Rejected document");
                    if self.record_failure() {
                        self.store.commit().await?;
                        return Ok(BatchOutcome::Tripped);
                    }
                    continue;
                }
            };

            self.breaker.record_success();
            info!(
                id,
                email = message.email.as_deref().unwrap_or("-"),
                sent_at = ?message.sent_at,
                subject = message.subject.as_deref().unwrap_or("-"),
                "Parsed"
            );

            let record = MessageRecord::new(id, message);
            if self.store.insert(&record).await? {
                self.stats.stored += 1;
            } else {
                debug!(id, "Already stored, insert ignored");
            }
            self.processed += 1;

            if self.policy.should_commit(self.processed) {
                self.store.commit().await?;
                debug!(processed = self.processed, "Committed");
            }
            if self.policy.should_pause(self.processed) {
                debug!(pause_ms = self.policy.pause.as_millis() as u64, "Pausing");
                tokio::time::sleep(self.policy.pause).await;
            }
        }

        self.store.commit().await?;
        Ok(BatchOutcome::Exhausted)
    }

    /// Commit and close the store, returning the session statistics.
    pub async fn finish(mut self) -> Result<HarvestStats> {
        self.store.close().await?;
        info!(
            cursor = self.cursor,
            fetched = self.stats.fetched,
            stored = self.stats.stored,
            skipped = self.stats.skipped,
            failed = self.stats.failed,
            "Harvest finished"
        );
        Ok(self.stats)
    }

    fn record_failure(&mut self) -> bool {
        self.stats.failed += 1;
        let tripped = self.breaker.record_failure();
        if tripped {
            error!(
                consecutive = self.breaker.consecutive_failures(),
                threshold = self.breaker.threshold(),
                "Too many consecutive failures, stopping"
            );
        }
        tripped
    }
}

/// Resolves once shutdown is requested. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
