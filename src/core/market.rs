//! Market data client abstraction and its single failure kind

use crate::core::coin::{Coin, HistoryRecord, SnapshotAck};
use async_trait::async_trait;
use std::fmt::Display;
use thiserror::Error;

/// The backend call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListCoins,
    StoreHistory,
    FetchHistory,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Operation::ListCoins => "Failed to fetch coins",
                Operation::StoreHistory => "Failed to store history",
                Operation::FetchHistory => "Failed to fetch history",
            }
        )
    }
}

/// Transport error, non-success status or undecodable body.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("{operation}: {message}")]
    Transport { operation: Operation, message: String },

    #[error("{operation} (HTTP {status})")]
    Status { operation: Operation, status: u16 },

    #[error("{operation}: invalid response body: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchFailure {
    pub fn operation(&self) -> Operation {
        match self {
            FetchFailure::Transport { operation, .. }
            | FetchFailure::Status { operation, .. }
            | FetchFailure::Decode { operation, .. } => *operation,
        }
    }
}

#[async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn list_coins(&self) -> Result<Vec<Coin>, FetchFailure>;

    async fn store_history_snapshot(&self) -> Result<SnapshotAck, FetchFailure>;

    async fn fetch_history(&self, coin_id: &str) -> Result<Vec<HistoryRecord>, FetchFailure>;
}
