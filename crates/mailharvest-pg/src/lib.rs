mod connect;
mod error;
pub mod store;

pub use connect::{connect_postgres, ConnectOptions, SslMode};
pub use error::{PgError, PgResult};
pub use store::{quote_ident, PostgresMessageStore, StoreSummary, DEFAULT_TABLE};
