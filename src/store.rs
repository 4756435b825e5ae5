//! Collaborator interfaces
//!
//! The wellness core does not own persistence, sensors or usage tracking.
//! These traits describe what it needs from the host application, and the
//! in-memory implementations back the CLI, the FFI layer and tests.

use crate::error::WellnessError;
use crate::types::{
    sort_newest_first, DailyWellnessRecord, InteractionEvent, SensorSleepSession,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date-keyed store of scored days
pub trait HistoryStore {
    /// Up to `limit_days` records, newest first
    fn get_history(&self, limit_days: usize) -> Result<Vec<DailyWellnessRecord>, WellnessError>;

    /// Insert or replace the record for its date (last write wins)
    fn upsert(&mut self, record: DailyWellnessRecord) -> Result<(), WellnessError>;
}

/// Health-data source for sensor-measured sleep
pub trait SensorProvider {
    fn read_most_recent_sleep_session(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Option<SensorSleepSession>, WellnessError>;
}

/// Usage-tracking source for raw device-interaction timestamps
pub trait EventSource {
    fn get_interaction_events(&self, date: NaiveDate)
        -> Result<Vec<InteractionEvent>, WellnessError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// History store backed by a date-ordered map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryHistoryStore {
    records: BTreeMap<NaiveDate, DailyWellnessRecord>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from arbitrary records; later duplicates win
    pub fn from_records(records: impl IntoIterator<Item = DailyWellnessRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.records.insert(record.date(), record);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyWellnessRecord> {
        self.records.get(&date)
    }

    /// All records, newest first
    pub fn records(&self) -> Vec<DailyWellnessRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        sort_newest_first(&mut records);
        records
    }

    /// Load a store from a JSON array of records
    pub fn from_json(json: &str) -> Result<Self, WellnessError> {
        let records: Vec<DailyWellnessRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Serialize the store as a JSON array of records, newest first
    pub fn to_json(&self) -> Result<String, WellnessError> {
        Ok(serde_json::to_string(&self.records())?)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get_history(&self, limit_days: usize) -> Result<Vec<DailyWellnessRecord>, WellnessError> {
        Ok(self
            .records
            .values()
            .rev()
            .take(limit_days)
            .cloned()
            .collect())
    }

    fn upsert(&mut self, record: DailyWellnessRecord) -> Result<(), WellnessError> {
        self.records.insert(record.date(), record);
        Ok(())
    }
}

/// Sensor provider returning a fixed session (or a fixed failure)
#[derive(Debug, Clone, Default)]
pub struct StaticSensorProvider {
    session: Option<SensorSleepSession>,
    failure: Option<String>,
}

impl StaticSensorProvider {
    pub fn new(session: Option<SensorSleepSession>) -> Self {
        Self {
            session,
            failure: None,
        }
    }

    /// No sensor data at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every read fails, e.g. a revoked health permission
    pub fn failing(reason: &str) -> Self {
        Self {
            session: None,
            failure: Some(reason.to_string()),
        }
    }
}

impl SensorProvider for StaticSensorProvider {
    fn read_most_recent_sleep_session(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Option<SensorSleepSession>, WellnessError> {
        if let Some(reason) = &self.failure {
            return Err(WellnessError::Sensor(reason.clone()));
        }
        // Only sessions overlapping the requested window are visible
        Ok(self
            .session
            .clone()
            .filter(|s| s.start_time < window_end && s.end_time > window_start))
    }
}

/// Event source serving a fixed list of interaction events
#[derive(Debug, Clone, Default)]
pub struct StaticEventSource {
    events: Vec<InteractionEvent>,
}

impl StaticEventSource {
    pub fn new(events: Vec<InteractionEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for StaticEventSource {
    fn get_interaction_events(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<InteractionEvent>, WellnessError> {
        Ok(self.events.clone())
    }
}
