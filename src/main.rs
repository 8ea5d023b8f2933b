use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use ledger_engine::config::{CliConfig, BALANCE_CACHE_CAPACITY, BALANCE_CACHE_IDLE, USAGE};
use ledger_engine::engine::ReplayEngine;
use ledger_engine::ledger::Ledger;
use ledger_engine::storage::{JournalStore, MemoryDirectory, MemoryJournal};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match CliConfig::from_args(std::env::args()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            eprintln!("{USAGE}");
            eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
            exit(1);
        }
    };

    setup_logging(config.log_level);

    let store = match &config.journal {
        Some(path) => MemoryJournal::open(path)?,
        None => MemoryJournal::new()
    };

    let directory = Arc::new(MemoryDirectory::new());
    let ledger = Arc::new(
        Ledger::new(Arc::new(store), directory.clone())
            .with_balance_cache(BALANCE_CACHE_CAPACITY, Some(BALANCE_CACHE_IDLE))
    );
    let engine = ReplayEngine::new(ledger.clone(), directory.clone());

    let timer = Instant::now();
    let summary = engine.run(&config.input).await?;
    let duration = timer.elapsed();

    info!("Applied [{}] and rejected [{}] operations in: {duration:?}", summary.applied, summary.rejected);

    write_results_to_stdout(&ledger, &directory, config.with_statement).await?;

    Ok(())
}

fn setup_logging(level: LevelFilter) {
    // stdout carries balances and statement lines; logs go to stderr.
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

async fn write_results_to_stdout<S: JournalStore>(ledger: &Ledger<S, MemoryDirectory>, directory: &MemoryDirectory, with_statement: bool) -> Result<()> {
    let accounts = directory.accounts();
    let mut statements = Vec::new();
    let mut balances = Vec::with_capacity(accounts.len());

    for account_id in accounts {
        let balance = ledger.get_balance(account_id, with_statement).await?;
        balances.push((account_id, balance.balance));
        statements.extend(balance.entries.unwrap_or_default());
    }

    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "account,balance")?;

    for (account_id, balance) in balances {
        writeln!(output, "{},{}", account_id, balance)?;
    }

    for view in statements {
        writeln!(output, "{}", serde_json::to_string(&view)?)?;
    }

    output.flush()?;

    Ok(())
}
