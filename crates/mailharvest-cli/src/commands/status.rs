use anyhow::{Context, Result};
use mailharvest_config::ProjectConfig;
use mailharvest_pg::PostgresMessageStore;

use crate::config::{connect_options, database_settings};

pub async fn cmd_status(config: ProjectConfig) -> Result<()> {
    let database = database_settings(&config)?;

    let store = PostgresMessageStore::connect(&connect_options(&database), &database.table)
        .await
        .context("Failed to connect to Postgres")?;

    let summary = store.summary().await.context("Failed to read message table")?;

    if summary.count == 0 {
        println!("No messages stored yet. Run 'mailharvest run' to start harvesting.");
        return Ok(());
    }

    let max_id = summary.max_id.unwrap_or(0);
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
    };

    println!("\nHarvest Status ({}):", database.table);
    println!("{:-<40}", "");
    println!("{:<20} {:>19}", "Messages", summary.count);
    println!("{:<20} {:>19}", "Highest id", max_id);
    println!("{:<20} {:>19}", "Next id", max_id + 1);
    println!("{:<20} {:>19}", "Oldest message", date(summary.oldest));
    println!("{:<20} {:>19}", "Newest message", date(summary.newest));
    println!();

    Ok(())
}
