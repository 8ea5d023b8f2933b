//! Runtime configuration of the `ledger-engine` binary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use tracing::level_filters::LevelFilter;

/// Capacity of the channel between the CSV reader and the ledger.
pub const CHANNEL_CAPACITY: usize = 256;
pub const BALANCE_CACHE_CAPACITY: u64 = 10_000;
pub const BALANCE_CACHE_IDLE: Duration = Duration::from_secs(300);

pub const USAGE: &str = "Usage: ledger-engine [input].csv [log_level:optional] [--journal path:optional] [--statement:optional] > [output].csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub input: PathBuf,
    pub log_level: LevelFilter,
    /// Commit log that makes the journal durable across runs.
    pub journal: Option<PathBuf>,
    /// Print every entry view as a JSON line after the balances.
    pub with_statement: bool
}

impl CliConfig {
    /// Parses the process arguments, including the program name in first position.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter().skip(1);
        let mut input = None;
        let mut log_level = None;
        let mut journal = None;
        let mut with_statement = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--journal" => {
                    let path = args.next().ok_or_else(|| anyhow!("--journal requires a path"))?;
                    journal = Some(PathBuf::from(path));
                }
                "--statement" => with_statement = true,
                _ if input.is_none() => input = Some(PathBuf::from(arg)),
                _ if log_level.is_none() => log_level = Some(parse_log_level(&arg)),
                _ => bail!("Unexpected argument '{arg}'")
            }
        }

        Ok(Self {
            input: input.ok_or_else(|| anyhow!("An input file is required"))?,
            log_level: log_level.unwrap_or(LevelFilter::ERROR),
            journal,
            with_statement
        })
    }
}

pub fn parse_log_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or_else(|_| {
        eprintln!("Unrecognised log level [{level}], using [error]");
        LevelFilter::ERROR
    })
}
