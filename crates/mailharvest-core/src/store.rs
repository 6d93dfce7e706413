use std::collections::BTreeMap;
use std::future::Future;

use crate::error::{Error, Result};
use crate::types::{MessageRecord, ParsedMessage};

/// Persistence for harvested messages.
///
/// Inserts are first-write-wins: inserting an `id` that is already stored is a
/// no-op. Writes become durable on [`MessageStore::commit`].
pub trait MessageStore: Send {
    /// Highest stored id, or `None` when the store is empty.
    fn max_id(&self) -> impl Future<Output = Result<Option<i64>>> + Send;

    fn contains(&self, id: i64) -> impl Future<Output = Result<bool>> + Send;

    /// Insert a record. Returns false if the id was already present.
    fn insert(&mut self, record: &MessageRecord) -> impl Future<Output = Result<bool>> + Send;

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Commit anything pending and release the underlying resources.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory store, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<i64, MessageRecord>,
    commits: usize,
    closed: bool,
    /// If set, `max_id` fails with this message.
    fail_max_id: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds empty records for `ids`.
    pub fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let records = ids
            .into_iter()
            .map(|id| {
                let message = ParsedMessage {
                    email: None,
                    sent_at: None,
                    subject: None,
                    headers: String::new(),
                    body: String::new(),
                };
                (id, MessageRecord::new(id, message))
            })
            .collect();

        Self {
            records,
            ..Default::default()
        }
    }

    /// Make `max_id` fail, simulating a broken startup query.
    pub fn failing_max_id(mut self, error_message: impl Into<String>) -> Self {
        self.fail_max_id = Some(error_message.into());
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&MessageRecord> {
        self.records.get(&id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.keys().copied().collect()
    }

    /// Number of commits issued so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl MessageStore for MemoryStore {
    fn max_id(&self) -> impl Future<Output = Result<Option<i64>>> + Send {
        let result = match &self.fail_max_id {
            Some(error) => Err(Error::Store(error.clone())),
            None => Ok(self.records.keys().next_back().copied()),
        };
        async move { result }
    }

    fn contains(&self, id: i64) -> impl Future<Output = Result<bool>> + Send {
        let found = self.records.contains_key(&id);
        async move { Ok(found) }
    }

    fn insert(&mut self, record: &MessageRecord) -> impl Future<Output = Result<bool>> + Send {
        let inserted = if self.records.contains_key(&record.id) {
            false
        } else {
            self.records.insert(record.id, record.clone());
            true
        };
        async move { Ok(inserted) }
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.commits += 1;
        async move { Ok(()) }
    }

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.commits += 1;
        self.closed = true;
        async move { Ok(()) }
    }
}
