//! Drives a [`Harvester`] through one or more batches.

use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Input;
use mailharvest_core::{ArchiveSource, BatchOutcome, HarvestStats, Harvester, MessageStore};
use tokio::sync::watch;
use tracing::{info, warn};

/// Supplies batch budgets. `None` ends the session.
pub trait BudgetSource {
    fn next_budget(&mut self) -> Result<Option<u64>>;
}

/// A single batch of a fixed size.
pub struct FixedBudget(Option<u64>);

impl FixedBudget {
    pub fn new(count: u64) -> Self {
        Self(Some(count))
    }
}

impl BudgetSource for FixedBudget {
    fn next_budget(&mut self) -> Result<Option<u64>> {
        Ok(self.0.take())
    }
}

/// Asks on the terminal how many messages to harvest next.
pub struct PromptBudget;

/// Terminal prompt when stdin is a TTY, plain line reads when it is piped.
pub fn stdin_budget() -> Box<dyn BudgetSource> {
    if std::io::stdin().is_terminal() {
        Box::new(PromptBudget)
    } else {
        Box::new(LineBudget::new(std::io::stdin().lock()))
    }
}

impl BudgetSource for PromptBudget {
    fn next_budget(&mut self) -> Result<Option<u64>> {
        loop {
            let answer: String = Input::new()
                .with_prompt("How many messages")
                .allow_empty(true)
                .interact_text()
                .context("Failed to read batch size")?;

            match parse_budget(&answer) {
                BudgetAnswer::Done => return Ok(None),
                BudgetAnswer::Budget(count) => return Ok(Some(count)),
                BudgetAnswer::Invalid => {
                    println!("{}", "Enter a number, or leave blank to stop.".yellow());
                }
            }
        }
    }
}

/// Reads budgets one line at a time, e.g. from piped stdin.
/// End of input ends the session like a blank line does.
pub struct LineBudget<R> {
    reader: R,
}

impl<R: BufRead> LineBudget<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> BudgetSource for LineBudget<R> {
    fn next_budget(&mut self) -> Result<Option<u64>> {
        loop {
            print!("How many messages: ");
            std::io::stdout().flush().ok();

            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .context("Failed to read batch size")?;
            if read == 0 {
                println!();
                return Ok(None);
            }

            match parse_budget(&line) {
                BudgetAnswer::Done => return Ok(None),
                BudgetAnswer::Budget(count) => return Ok(Some(count)),
                BudgetAnswer::Invalid => {
                    println!("{}", "Enter a number, or leave blank to stop.".yellow());
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BudgetAnswer {
    Done,
    Budget(u64),
    Invalid,
}

pub fn parse_budget(answer: &str) -> BudgetAnswer {
    let answer = answer.trim();
    if answer.is_empty() {
        return BudgetAnswer::Done;
    }
    match answer.parse::<u64>() {
        Ok(count) => BudgetAnswer::Budget(count),
        Err(_) => BudgetAnswer::Invalid,
    }
}

/// What a finished session looked like.
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    pub stats: HarvestStats,
    /// Last id attempted.
    pub cursor: i64,
    /// Set when the session ended on an interrupt or a breaker trip.
    pub stopped: Option<BatchOutcome>,
}

/// Install a Ctrl-C handler that flips the returned channel to `true`.
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping after the current fetch");
                let _ = tx.send(true);
            }
            Err(e) => warn!(error = %e, "Could not install Ctrl-C handler"),
        }
    });

    rx
}

/// Resume, then run batches until the budget source is done or a batch ends the run.
/// The store is closed on every exit path, including errors.
pub async fn run_session<S, M>(
    mut harvester: Harvester<S, M>,
    budgets: &mut dyn BudgetSource,
    shutdown: &watch::Receiver<bool>,
) -> Result<SessionReport>
where
    S: ArchiveSource,
    M: MessageStore,
{
    harvester.resume().await;
    let driven = drive_batches(&mut harvester, budgets, shutdown).await;

    let cursor = harvester.cursor();
    let closed = harvester.finish().await;

    match (driven, closed) {
        (Ok(stopped), Ok(stats)) => Ok(SessionReport {
            stats,
            cursor,
            stopped,
        }),
        (Ok(_), Err(e)) => Err(e).context("Failed to close the message store"),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "Failed to close the message store");
            }
            Err(e)
        }
    }
}

async fn drive_batches<S, M>(
    harvester: &mut Harvester<S, M>,
    budgets: &mut dyn BudgetSource,
    shutdown: &watch::Receiver<bool>,
) -> Result<Option<BatchOutcome>>
where
    S: ArchiveSource,
    M: MessageStore,
{
    loop {
        if *shutdown.borrow() {
            return Ok(Some(BatchOutcome::Interrupted));
        }

        let Some(budget) = budgets.next_budget()? else {
            return Ok(None);
        };

        let outcome = harvester.run_batch(budget).await.context("Harvest failed")?;
        info!(budget, outcome = ?outcome, stats = %harvester.stats().format(), "Batch finished");

        if outcome.is_terminal() {
            return Ok(Some(outcome));
        }
    }
}

pub fn print_report(report: &SessionReport, dry_run: bool) {
    println!();
    match report.stopped {
        Some(BatchOutcome::Interrupted) => println!("{}", "Harvest interrupted.".yellow()),
        Some(BatchOutcome::Tripped) => {
            println!("{}", "Harvest stopped after too many consecutive failures.".red())
        }
        _ => println!("{}", "Harvest complete.".green()),
    }

    println!("  {:<10} {:>8}", "Fetched", report.stats.fetched);
    println!("  {:<10} {:>8}", "Stored", report.stats.stored);
    println!("  {:<10} {:>8}", "Skipped", report.stats.skipped);
    println!("  {:<10} {:>8}", "Failed", report.stats.failed);
    println!("  {:<10} {:>8}", "Last id", report.cursor);

    if dry_run {
        println!("\n{}", "(dry run - nothing was written to the database)".dimmed());
    }
    println!();
}
