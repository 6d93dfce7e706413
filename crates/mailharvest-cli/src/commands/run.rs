use anyhow::{Context, Result};
use colored::Colorize;
use mailharvest_config::ProjectConfig;
use mailharvest_core::{Harvester, MemoryStore};
use mailharvest_http::HttpArchive;
use mailharvest_pg::PostgresMessageStore;
use tracing::info;

use crate::config::{archive_settings, connect_options, database_settings, harvest_policy};
use crate::runner::{self, BudgetSource, FixedBudget};

pub async fn cmd_run(config: ProjectConfig, count: Option<u64>, dry_run: bool) -> Result<()> {
    let policy = harvest_policy(&config)?;
    let source =
        HttpArchive::new(archive_settings(&config)?).context("Failed to build HTTP client")?;

    let archive = source.settings();
    info!(
        base_url = %archive.base_url,
        timeout_secs = archive.timeout.as_secs(),
        accept_invalid_certs = archive.accept_invalid_certs,
        dry_run,
        "Starting harvest"
    );

    let shutdown = runner::shutdown_on_ctrl_c();

    let mut budgets: Box<dyn BudgetSource> = match count {
        Some(count) => Box::new(FixedBudget::new(count)),
        None => {
            println!("{}", "Enter a batch size; leave blank to stop.".dimmed());
            runner::stdin_budget()
        }
    };

    let report = if dry_run {
        let harvester = Harvester::new(source, MemoryStore::new(), policy, shutdown.clone());
        runner::run_session(harvester, budgets.as_mut(), &shutdown).await?
    } else {
        let database = database_settings(&config)?;
        let store = PostgresMessageStore::connect(&connect_options(&database), &database.table)
            .await
            .context("Failed to connect to Postgres")?;
        let harvester = Harvester::new(source, store, policy, shutdown.clone());
        runner::run_session(harvester, budgets.as_mut(), &shutdown).await?
    };

    runner::print_report(&report, dry_run);
    Ok(())
}
