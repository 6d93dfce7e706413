//! PostgreSQL-backed message storage.
//!
//! Messages live in a single table (default `messages`) keyed by their archive id.
//! Writes are grouped into explicit transactions that the harvester commits
//! periodically.

use std::future::Future;

use chrono::{DateTime, Utc};
use mailharvest_core::{MessageRecord, MessageStore};
use tokio_postgres::Client;
use tracing::{debug, info};

use crate::connect::{connect_postgres, ConnectOptions};
use crate::error::{PgError, PgResult};

pub const DEFAULT_TABLE: &str = "messages";

/// Aggregate view of the stored messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSummary {
    pub count: i64,
    /// Highest stored id. The next harvest resumes after it.
    pub max_id: Option<i64>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Message store backed by a Postgres table.
pub struct PostgresMessageStore {
    client: Client,
    table: String,
    in_transaction: bool,
}

impl PostgresMessageStore {
    /// Connect to Postgres and make sure the message table exists.
    pub async fn connect(options: &ConnectOptions, table: &str) -> PgResult<Self> {
        let client = connect_postgres(options).await?;
        Self::from_client(client, table).await
    }

    /// Create a store from an existing client.
    pub async fn from_client(client: Client, table: &str) -> PgResult<Self> {
        let store = Self {
            client,
            table: quote_ident(table),
            in_transaction: false,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the message table if it is absent.
    pub async fn ensure_schema(&self) -> PgResult<()> {
        debug!(table = %self.table, "Ensuring message schema exists");

        self.client.batch_execute(&create_table_sql(&self.table)).await?;

        info!(table = %self.table, "Message schema initialized");
        Ok(())
    }

    pub async fn summary(&self) -> PgResult<StoreSummary> {
        let row = self
            .client
            .query_one(
                &format!(
                    "SELECT COUNT(*), MAX(id), MIN(sent_at), MAX(sent_at) FROM {}",
                    self.table
                ),
                &[],
            )
            .await?;

        Ok(StoreSummary {
            count: row.get(0),
            max_id: row.get(1),
            oldest: row.get(2),
            newest: row.get(3),
        })
    }

    async fn begin_if_needed(&mut self) -> PgResult<()> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN").await?;
            self.in_transaction = true;
        }
        Ok(())
    }

    async fn commit_pending(&mut self) -> PgResult<()> {
        if self.in_transaction {
            // Cleared first so a failed COMMIT is not retried against an aborted transaction.
            self.in_transaction = false;
            self.client.batch_execute("COMMIT").await?;
            debug!(table = %self.table, "Committed message batch");
        }
        Ok(())
    }

    async fn insert_record(&mut self, record: &MessageRecord) -> PgResult<bool> {
        self.begin_if_needed().await?;

        let message = &record.message;
        let rows = self
            .client
            .execute(
                &insert_sql(&self.table),
                &[
                    &record.id,
                    &message.email,
                    &message.sent_at,
                    &message.subject,
                    &message.headers,
                    &message.body,
                ],
            )
            .await?;

        Ok(rows == 1)
    }
}

impl MessageStore for PostgresMessageStore {
    fn max_id(&self) -> impl Future<Output = mailharvest_core::Result<Option<i64>>> + Send {
        async move {
            let row = self
                .client
                .query_one(&format!("SELECT MAX(id) FROM {}", self.table), &[])
                .await
                .map_err(PgError::from)?;
            Ok(row.get::<_, Option<i64>>(0))
        }
    }

    fn contains(&self, id: i64) -> impl Future<Output = mailharvest_core::Result<bool>> + Send {
        async move {
            let row = self
                .client
                .query_opt(&format!("SELECT 1 FROM {} WHERE id = $1", self.table), &[&id])
                .await
                .map_err(PgError::from)?;
            Ok(row.is_some())
        }
    }

    fn insert(
        &mut self,
        record: &MessageRecord,
    ) -> impl Future<Output = mailharvest_core::Result<bool>> + Send {
        async move { Ok(self.insert_record(record).await?) }
    }

    fn commit(&mut self) -> impl Future<Output = mailharvest_core::Result<()>> + Send {
        async move { Ok(self.commit_pending().await?) }
    }

    fn close(&mut self) -> impl Future<Output = mailharvest_core::Result<()>> + Send {
        async move {
            self.commit_pending().await?;
            info!(table = %self.table, "Message store closed");
            Ok(())
        }
    }
}

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            row_id SERIAL PRIMARY KEY,
            id BIGINT NOT NULL UNIQUE,
            email TEXT,
            sent_at TIMESTAMPTZ,
            subject TEXT,
            headers TEXT,
            body TEXT
        )
        "#
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {table} (id, email, sent_at, subject, headers, body)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("messages"), "\"messages\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql(&quote_ident(DEFAULT_TABLE));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"messages\""));
        assert!(sql.contains("id BIGINT NOT NULL UNIQUE"));
        assert!(sql.contains("row_id SERIAL PRIMARY KEY"));
        assert!(sql.contains("sent_at TIMESTAMPTZ"));
    }

    #[test]
    fn test_insert_sql_is_first_write_wins() {
        let sql = insert_sql("\"messages\"");
        assert!(sql.contains("INSERT INTO \"messages\" (id, email, sent_at, subject, headers, body)"));
        assert!(sql.contains("ON CONFLICT (id) DO NOTHING"));
    }
}
