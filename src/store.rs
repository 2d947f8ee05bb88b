//! Reading store
//!
//! Holds the complete reading set currently on display. A data load replaces
//! the whole set at once, so a reader sees either the old set or the new one.
//!
//! Every load is issued a [`LoadTicket`]. Only the most recent ticket may
//! apply its result; a slower, superseded load is discarded instead of
//! overwriting newer data.

use crate::source::DataSourceKind;
use crate::types::{Reading, SensorPayload};
use std::sync::Arc;
use tracing::{info, warn};

/// Handle for one in-flight data load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: DataSourceKind,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> DataSourceKind {
        self.source
    }
}

/// Loading state shown by the views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// User-visible fetch failure; recover with a fresh load
    Failed(String),
}

/// Current reading set plus load bookkeeping
#[derive(Debug)]
pub struct ReadingStore {
    readings: Arc<[Reading]>,
    source: Option<DataSourceKind>,
    reported_count: Option<u64>,
    issued: u64,
    applied: u64,
    state: LoadState,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub fn new() -> Self {
        Self {
            readings: Arc::from(Vec::new()),
            source: None,
            reported_count: None,
            issued: 0,
            applied: 0,
            state: LoadState::Idle,
        }
    }

    /// Start a load; any earlier unfinished load becomes stale.
    pub fn begin_load(&mut self, source: DataSourceKind) -> LoadTicket {
        self.issued += 1;
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.issued,
            source,
        }
    }

    /// Replace the reading set with a load's result.
    ///
    /// Returns `false`, leaving the store untouched, when the ticket has been
    /// superseded by a later `begin_load`.
    pub fn apply(&mut self, ticket: LoadTicket, payload: SensorPayload) -> bool {
        if !self.is_current(ticket) {
            warn!(
                generation = ticket.generation,
                latest = self.issued,
                source = ticket.source.as_str(),
                "Discarding result of superseded data load"
            );
            return false;
        }

        info!(
            generation = ticket.generation,
            source = ticket.source.as_str(),
            readings = payload.data.len(),
            reported = ?payload.count,
            "Replacing reading set"
        );
        self.readings = Arc::from(payload.data);
        self.source = Some(ticket.source);
        self.reported_count = payload.count;
        self.applied = ticket.generation;
        self.state = LoadState::Ready;
        true
    }

    /// Record a failed load. Stale failures are ignored.
    pub fn fail(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let message = message.into();
        warn!(generation = ticket.generation, error = %message, "Data load failed");
        self.state = LoadState::Failed(message);
        true
    }

    fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.issued
    }

    /// Snapshot of the current set; stays valid across later replacements.
    pub fn snapshot(&self) -> Arc<[Reading]> {
        Arc::clone(&self.readings)
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Source of the set currently held
    pub fn source(&self) -> Option<DataSourceKind> {
        self.source
    }

    /// Record count the backend claimed for the set currently held
    pub fn reported_count(&self) -> Option<u64> {
        self.reported_count
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Generation of the set currently held (0 before the first load)
    pub fn generation(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(n: usize) -> SensorPayload {
        let data = (0..n)
            .map(|i| Reading {
                id: i as i64,
                lat: 0.0,
                lon: 0.0,
                lux: 100,
                area: None,
                street: None,
                timestamp: String::new(),
                sensor_label: String::new(),
                uploaded_at: None,
            })
            .collect();
        SensorPayload { data, count: None }
    }

    #[test]
    fn test_apply_replaces_whole_set() {
        let mut store = ReadingStore::new();
        assert_eq!(store.state(), &LoadState::Idle);

        let ticket = store.begin_load(DataSourceKind::Sample);
        assert_eq!(store.state(), &LoadState::Loading);
        assert!(store.apply(ticket, readings(3)));
        let before = store.snapshot();

        let ticket = store.begin_load(DataSourceKind::Api);
        assert!(store.apply(ticket, readings(5)));

        assert_eq!(before.len(), 3);
        assert_eq!(store.readings().len(), 5);
        assert_eq!(store.source(), Some(DataSourceKind::Api));
        assert_eq!(store.generation(), 2);
        assert_eq!(store.state(), &LoadState::Ready);
        assert_eq!(store.reported_count(), None);
    }

    #[test]
    fn test_reported_count_follows_set() {
        let mut store = ReadingStore::new();

        let ticket = store.begin_load(DataSourceKind::Api);
        let payload = SensorPayload {
            count: Some(7),
            ..readings(1)
        };
        assert!(store.apply(ticket, payload));
        assert_eq!(store.readings().len(), 1);
        assert_eq!(store.reported_count(), Some(7));

        let ticket = store.begin_load(DataSourceKind::Sample);
        assert!(store.apply(ticket, readings(2)));
        assert_eq!(store.reported_count(), None);
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let mut store = ReadingStore::new();

        let slow_api = store.begin_load(DataSourceKind::Api);
        let sample = store.begin_load(DataSourceKind::Sample);

        assert!(store.apply(sample, readings(50)));
        assert!(!store.apply(slow_api, readings(2)));

        assert_eq!(store.readings().len(), 50);
        assert_eq!(store.source(), Some(DataSourceKind::Sample));
        assert_eq!(store.generation(), sample.generation());
    }

    #[test]
    fn test_failure_keeps_previous_set() {
        let mut store = ReadingStore::new();
        let first = store.begin_load(DataSourceKind::Sample);
        store.apply(first, readings(4));

        let fetch = store.begin_load(DataSourceKind::Api);
        assert!(store.fail(fetch, "Failed to fetch sensor data (HTTP 500)"));

        assert_eq!(
            store.state(),
            &LoadState::Failed("Failed to fetch sensor data (HTTP 500)".to_string())
        );
        assert_eq!(store.readings().len(), 4);

        let retry = store.begin_load(DataSourceKind::Api);
        assert!(!store.fail(fetch, "late"));
        assert!(store.apply(retry, readings(1)));
        assert_eq!(store.state(), &LoadState::Ready);
    }
}
