mod operation;
mod replay_engine;
#[cfg(test)]
mod tests;

pub use operation::{Operation, OperationType};
pub use replay_engine::{ReplayEngine, ReplaySummary};
