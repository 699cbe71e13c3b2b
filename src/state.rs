use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::BackendClient;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::model::{ComparisonResult, QueryReport};
use crate::poller::StatsPoller;

pub type SharedState = Arc<ConsoleState>;

pub struct ConsoleState {
    pub config: ConsoleConfig,
    pub backend: Arc<BackendClient>,
    pub stats: StatsPoller<BackendClient>,
    pub last_query: RwLock<ResultSlot<QueryReport>>,
    pub last_comparison: RwLock<ResultSlot<ComparisonResult>>,
    submissions: AtomicU64,
    pub started_at: DateTime<Utc>,
}

impl ConsoleState {
    pub fn new(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let backend = Arc::new(BackendClient::new(&config.backend_url, timeout)?);
        let stats = StatsPoller::new(
            backend.clone(),
            Duration::from_secs(config.poll_interval_secs),
        );

        Ok(Self {
            config,
            backend,
            stats,
            last_query: RwLock::new(ResultSlot::new()),
            last_comparison: RwLock::new(ResultSlot::new()),
            submissions: AtomicU64::new(0),
            started_at: Utc::now(),
        })
    }

    /// Tags a new user submission. Sequence numbers start at 1.
    pub fn next_submission(&self) -> u64 {
        self.submissions.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Latest result of one kind of submission, owned by the console so the
/// presenter only renders.
///
/// Resolutions are applied in submission order: one tagged with a sequence
/// older than what was already applied is discarded. A failure replaces the
/// error message but keeps the last successful value.
#[derive(Debug)]
pub struct ResultSlot<T> {
    applied_sequence: u64,
    value: Option<Arc<T>>,
    error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl<T> ResultSlot<T> {
    pub fn new() -> Self {
        Self {
            applied_sequence: 0,
            value: None,
            error: None,
            updated_at: None,
        }
    }

    /// Returns false when the resolution was stale and dropped.
    pub fn apply(&mut self, sequence: u64, result: Result<Arc<T>, String>) -> bool {
        if sequence < self.applied_sequence {
            debug!(
                "Dropping stale resolution #{} (already showing #{})",
                sequence, self.applied_sequence
            );
            return false;
        }

        self.applied_sequence = sequence;
        self.updated_at = Some(Utc::now());
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
        true
    }

    pub fn value(&self) -> Option<Arc<T>> {
        self.value.clone()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn applied_sequence(&self) -> u64 {
        self.applied_sequence
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl<T> Default for ResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        let slot: ResultSlot<u32> = ResultSlot::new();
        assert!(slot.value().is_none());
        assert!(slot.error().is_none());
        assert_eq!(slot.applied_sequence(), 0);
        assert!(slot.updated_at().is_none());
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut slot = ResultSlot::new();
        assert!(slot.apply(1, Ok(Arc::new(7))));
        assert!(slot.apply(2, Err("invalid path".to_string())));
        assert_eq!(slot.value().as_deref(), Some(&7));
        assert_eq!(slot.error(), Some("invalid path"));
    }

    #[test]
    fn test_success_clears_error() {
        let mut slot = ResultSlot::new();
        slot.apply(1, Err::<Arc<u32>, _>("boom".to_string()));
        slot.apply(2, Ok(Arc::new(3)));
        assert!(slot.error().is_none());
        assert_eq!(slot.value().as_deref(), Some(&3));
    }

    #[test]
    fn test_stale_resolution_is_dropped() {
        let mut slot = ResultSlot::new();
        // Submission #2 resolves before #1.
        assert!(slot.apply(2, Ok(Arc::new("fast"))));
        assert!(!slot.apply(1, Ok(Arc::new("slow"))));
        assert_eq!(slot.value().as_deref(), Some(&"fast"));
        assert_eq!(slot.applied_sequence(), 2);
    }
}
