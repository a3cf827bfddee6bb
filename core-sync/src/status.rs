//! # Sync Status State Machine
//!
//! Tracks where the catalog sync is in its lifecycle.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──→ Syncing ──→ Completed
//!             │  ↑          │
//!             ↓  └──────────┤
//!           Error ──────────┘ (next begin)
//! ```
//!
//! `Completed` and `Error` are sticky: they only change when the next pass
//! begins. Beginning a pass clears the previous error right away.

use crate::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the catalog sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Completed { at: DateTime<Utc> },
    Error { message: String },
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Completed { .. } => "completed",
            SyncStatus::Error { .. } => "error",
        }
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a UI shows about sync progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatus,
    pub last_error: Option<String>,
    /// Completion time of the last successful pass
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Enter `Syncing`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass is already syncing
    pub fn begin(&self) -> Result<Self> {
        if self.status.is_syncing() {
            return Err(self.invalid("syncing"));
        }
        Ok(Self {
            status: SyncStatus::Syncing,
            last_error: None,
            last_sync_time: self.last_sync_time,
        })
    }

    /// Finish the running pass successfully at `at`.
    pub fn complete(&self, at: DateTime<Utc>) -> Result<Self> {
        if !self.status.is_syncing() {
            return Err(self.invalid("completed"));
        }
        Ok(Self {
            status: SyncStatus::Completed { at },
            last_error: None,
            last_sync_time: Some(at),
        })
    }

    /// Abort the running pass with `message`.
    pub fn fail(&self, message: impl Into<String>) -> Result<Self> {
        if !self.status.is_syncing() {
            return Err(self.invalid("error"));
        }
        let message = message.into();
        Ok(Self {
            status: SyncStatus::Error {
                message: message.clone(),
            },
            last_error: Some(message),
            last_sync_time: self.last_sync_time,
        })
    }

    fn invalid(&self, to: &str) -> SyncError {
        SyncError::InvalidStateTransition {
            from: self.status.as_str().to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let idle = SyncState::default();
        assert_eq!(idle.status, SyncStatus::Idle);

        let syncing = idle.begin().unwrap();
        assert!(syncing.status.is_syncing());

        let done = syncing.complete(at(100)).unwrap();
        assert_eq!(done.status, SyncStatus::Completed { at: at(100) });
        assert_eq!(done.last_sync_time, Some(at(100)));
        assert_eq!(done.last_error, None);
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let failed = SyncState::default()
            .begin()
            .unwrap()
            .fail("network down")
            .unwrap();
        assert_eq!(failed.last_error.as_deref(), Some("network down"));

        let retry = failed.begin().unwrap();
        assert_eq!(retry.last_error, None);
        assert!(retry.status.is_syncing());
    }

    #[test]
    fn test_failure_keeps_last_sync_time() {
        let done = SyncState::default()
            .begin()
            .unwrap()
            .complete(at(5))
            .unwrap();
        let failed = done.begin().unwrap().fail("boom").unwrap();
        assert_eq!(failed.last_sync_time, Some(at(5)));
        assert_eq!(failed.status.to_string(), "error");
    }

    #[test]
    fn test_invalid_transitions() {
        let idle = SyncState::default();
        assert!(matches!(
            idle.complete(at(1)),
            Err(SyncError::InvalidStateTransition { .. })
        ));
        assert!(idle.fail("x").is_err());

        let syncing = idle.begin().unwrap();
        match syncing.begin() {
            Err(SyncError::InvalidStateTransition { from, to }) => {
                assert_eq!(from, "syncing");
                assert_eq!(to, "syncing");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
