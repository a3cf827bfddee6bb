use bridge_traits::{error::BridgeError, MediaKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch {kind}s{}: {source}", scope_suffix(.provider))]
    Fetch {
        kind: MediaKind,
        provider: Option<String>,
        source: BridgeError,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

fn scope_suffix(provider: &Option<String>) -> String {
    provider
        .as_ref()
        .map(|p| format!(" from {}", p))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SyncError>;
