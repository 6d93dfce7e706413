use anyhow::{Context, Result};
use colored::Colorize;
use mailharvest_config::ProjectConfig;
use mailharvest_pg::PostgresMessageStore;

use crate::config::{connect_options, database_settings};

pub async fn cmd_setup(config: ProjectConfig) -> Result<()> {
    let database = database_settings(&config)?;

    println!("Setting up mailharvest database table...\n");
    println!("The following table will be created if it does not exist:");
    println!("  - {}  - one row per archived message, keyed by archive id", database.table);
    println!();

    // Connecting creates the table.
    let _store = PostgresMessageStore::connect(&connect_options(&database), &database.table)
        .await
        .context("Failed to connect to Postgres")?;

    println!("{}", "Database table ready!".green());
    println!("\nNext step:");
    println!("  Run: mailharvest run\n");

    Ok(())
}
