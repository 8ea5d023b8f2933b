//! Append-only ledger engine: per-account balances derived from an immutable
//! journal of deposits, withdrawals and transfers, never allowed below zero.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod models;
pub mod storage;
pub mod types;
