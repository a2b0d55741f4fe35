//! Registrar error type.

use crate::expectation::{DeliveryError, ExpectationSnapshot, MatchError};
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum HockError {
    #[error("Unprocessed requests in assertions queue:\n{}", format_snapshots(.0))]
    Unsatisfied(Vec<ExpectationSnapshot>),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid fixture: {0}")]
    Config(String),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

fn format_snapshots(snapshots: &[ExpectationSnapshot]) -> String {
    serde_json::to_string_pretty(snapshots).unwrap_or_default()
}
