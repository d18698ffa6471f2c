//! Event processing against the stored ledger.
//!
//! [`LedgerContext`] is the explicit context object every operation runs
//! against. It owns no mutable state itself: records are loaded, changed and
//! upserted per event, so a single caller processing events one at a time is
//! the only writer.

pub mod processor;
pub mod registry;
pub mod txlog;

use crate::db::Repository;
use crate::engine::{ConsistencyFault, SnapshotScheduler};
use crate::oracle::Oracle;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
pub struct LedgerContext {
    repo: Arc<Repository>,
    oracle: Arc<dyn Oracle>,
    scheduler: SnapshotScheduler,
}

impl LedgerContext {
    pub fn new(repo: Arc<Repository>, oracle: Arc<dyn Oracle>, scheduler: SnapshotScheduler) -> Self {
        Self {
            repo,
            oracle,
            scheduler,
        }
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn scheduler(&self) -> &SnapshotScheduler {
        &self.scheduler
    }
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The event contradicted stored state. Vault-level effects were still
    /// applied; the affected position was not.
    Fault(ConsistencyFault),
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EventOutcome::Applied)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
