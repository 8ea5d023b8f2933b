use super::{ReplayEngine, ReplaySummary};

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::NamedTempFile;

use crate::ledger::Ledger;
use crate::storage::{MemoryDirectory, MemoryJournal};
use crate::types::AccountId;

type TestEngine = (ReplayEngine<MemoryJournal>, Arc<Ledger<MemoryJournal, MemoryDirectory>>, Arc<MemoryDirectory>);

fn create_engine() -> TestEngine {
    let directory = Arc::new(MemoryDirectory::new());
    let ledger = Arc::new(Ledger::new(Arc::new(MemoryJournal::new()), directory.clone()));
    let engine = ReplayEngine::new(ledger.clone(), directory.clone()).with_backpressure(2);

    (engine, ledger, directory)
}

fn create_temporary_csv(rows: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;

    writeln!(file, "type,account,counterparty,amount,description")?;

    for row in rows {
        writeln!(file, "{row}")?;
    }

    Ok(file)
}

async fn balance_of(ledger: &Ledger<MemoryJournal, MemoryDirectory>, account_id: AccountId) -> Result<String> {
    Ok(ledger.get_balance(account_id, false).await?.balance.to_string())
}

#[tokio::test]
async fn test_engine_replays_operations_in_file_order() -> Result<()> {
    let (engine, ledger, directory) = create_engine();
    let file = create_temporary_csv(&[
        "open,1,,,",
        "open,2,,,",
        "deposit,1,,500,salary",
        "transfer,1,2,200,\"rent, march\"",
        "withdraw,2,,50.5,groceries",
    ])?;

    let summary = engine.run(file.path()).await?;

    assert_eq!(summary, ReplaySummary { applied: 5, rejected: 0 });
    assert_eq!(directory.accounts(), vec![1, 2]);
    assert_eq!(balance_of(&ledger, 1).await?, "300.00");
    assert_eq!(balance_of(&ledger, 2).await?, "149.50");

    Ok(())
}

#[tokio::test]
async fn test_engine_counts_rejected_operations_and_keeps_going() -> Result<()> {
    let (engine, ledger, _) = create_engine();
    let file = create_temporary_csv(&[
        "open,1,,,",
        "open,1,,,",
        "deposit,1,,10,salary",
        "withdraw,1,,25,rent",
        "transfer,1,,5,missing receiver",
        "deposit,9,,5,unknown account",
        "deposit,1,,,no amount",
        "deposit,1,,2.5,bonus",
    ])?;

    let summary = engine.run(file.path()).await?;

    assert_eq!(summary, ReplaySummary { applied: 3, rejected: 5 });
    assert_eq!(balance_of(&ledger, 1).await?, "12.50");

    Ok(())
}

#[tokio::test]
async fn test_engine_gracefully_skips_malformed_csv_input() -> Result<()> {
    let (engine, ledger, _) = create_engine();
    let file = create_temporary_csv(&[
        "open,1,,,",
        "deposit,1,,10.0,salary",
        "invalid,data,here,0,x",
        "deposit,1,,5.0,bonus",
    ])?;

    let summary = engine.run(file.path()).await?;

    assert_eq!(summary.applied, 3);
    assert_eq!(ledger.get_balance(1, false).await?.balance, Decimal::from_str("15")?);

    Ok(())
}

#[tokio::test]
async fn test_engine_handles_missing_csv_file_without_error() -> Result<()> {
    let (engine, _, directory) = create_engine();

    let summary = engine.run("missing.csv").await?;

    assert_eq!(summary, ReplaySummary::default());
    assert!(directory.accounts().is_empty());

    Ok(())
}
