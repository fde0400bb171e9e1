//! Post-verdict side effects: usage charging and output persistence.
//!
//! None of these steps can fail a request. Each failure is logged at `warn`
//! and the remaining steps still run.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use veritas_core::VerdictRecord;
use veritas_store::{OutputStore, StoreError, UsageEvent};

pub const CASE_SCORED: &str = "case_scored";
pub const AUDIT_COMPLETED: &str = "audit_completed";
pub const RITUAL_SUGGESTED: &str = "ritual_suggested";

/// Key under which the final record is stored.
pub const OUTPUT_KEY: &str = "OUTPUT";

#[derive(Debug, Error)]
pub enum BookkeepingError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Rejected(String),
}

/// Sink for usage events and persisted verdicts.
pub trait Bookkeeper: Send + Sync {
    fn charge(&self, event: &UsageEvent) -> Result<(), BookkeepingError>;
    fn push_data(&self, item: &Value) -> Result<(), BookkeepingError>;
    fn set_value(&self, key: &str, value: &Value) -> Result<(), BookkeepingError>;
}

/// Bookkeeper writing into a local [`OutputStore`].
pub struct StoreBookkeeper {
    store: OutputStore,
}

impl StoreBookkeeper {
    pub fn new(store: OutputStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }
}

impl Bookkeeper for StoreBookkeeper {
    fn charge(&self, event: &UsageEvent) -> Result<(), BookkeepingError> {
        Ok(self.store.record_usage(event)?)
    }

    fn push_data(&self, item: &Value) -> Result<(), BookkeepingError> {
        Ok(self.store.push_data(item)?)
    }

    fn set_value(&self, key: &str, value: &Value) -> Result<(), BookkeepingError> {
        Ok(self.store.set_value(key, value)?)
    }
}

/// Usage events earned by `record`, one unit each.
pub fn usage_events(record: &VerdictRecord) -> Vec<UsageEvent> {
    [
        (CASE_SCORED, record.tier.is_some()),
        (AUDIT_COMPLETED, record.fairness_score.is_some()),
        (RITUAL_SUGGESTED, record.ritual.is_some()),
    ]
    .into_iter()
    .filter(|(_, earned)| *earned)
    .map(|(name, _)| UsageEvent::new(name, 1))
    .collect()
}

/// Charge usage, push the record as a dataset item and store it under
/// [`OUTPUT_KEY`]. Returns the number of steps that failed.
pub fn record_verdict(record: &VerdictRecord, bookkeeper: &dyn Bookkeeper) -> usize {
    let mut failures = 0;
    for event in usage_events(record) {
        if let Err(e) = bookkeeper.charge(&event) {
            warn!(event = %event.event_name, error = %e, "usage charge failed");
            failures += 1;
        }
    }

    let value = record.to_value();
    if let Err(e) = bookkeeper.push_data(&value) {
        warn!(error = %e, "dataset push failed");
        failures += 1;
    }
    if let Err(e) = bookkeeper.set_value(OUTPUT_KEY, &value) {
        warn!(key = OUTPUT_KEY, error = %e, "output store failed");
        failures += 1;
    }

    info!(failures, "bookkeeping complete");
    failures
}
