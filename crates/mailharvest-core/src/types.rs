use chrono::{DateTime, FixedOffset};

/// Fields extracted from one archived message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    /// Sender address, lowercased.
    pub email: Option<String>,
    /// Send time as written in the `Date:` header.
    pub sent_at: Option<DateTime<FixedOffset>>,
    /// Subject line, trimmed and lowercased.
    pub subject: Option<String>,
    /// Raw header block (everything before the first blank line).
    pub headers: String,
    /// Raw body (everything after the first blank line).
    pub body: String,
}

/// A parsed message keyed by its position in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    /// Archive sequence position. Unique in the store.
    pub id: i64,
    pub message: ParsedMessage,
}

impl MessageRecord {
    pub fn new(id: i64, message: ParsedMessage) -> Self {
        Self { id, message }
    }
}

/// Counters accumulated over a harvest session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Documents successfully retrieved from the archive.
    pub fetched: u64,
    /// Records written to the store.
    pub stored: u64,
    /// Ids passed over because the store already had them.
    pub skipped: u64,
    /// Fetch, format and date failures.
    pub failed: u64,
}

impl HarvestStats {
    pub fn format(&self) -> String {
        format!(
            "{} fetched, {} stored, {} skipped, {} failed",
            self.fetched, self.stored, self.skipped, self.failed
        )
    }
}
