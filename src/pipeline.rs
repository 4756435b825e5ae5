//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Wellness.
//!
//! Stateless entry points wrap each algorithm with default configuration.
//! [`WellnessProcessor`] wires them to injected collaborators and runs the
//! full flow once per metrics submission:
//!
//! 1. CompositeScorer - score the submitted day
//! 2. HistoryStore - upsert the record by date
//! 3. BaselineAnomalyDetector - evaluate a fresh history snapshot
//! 4. AlertDispatcher - record and forward each alert

use crate::anomaly::BaselineAnomalyDetector;
use crate::config::WellnessConfig;
use crate::dispatch::{AlertDispatcher, DispatchOutcome};
use crate::error::WellnessError;
use crate::scoring::{CompositeScorer, SubScores};
use crate::sleep::SleepSignalResolver;
use crate::store::{
    EventSource, HistoryStore, MemoryHistoryStore, SensorProvider, StaticEventSource,
    StaticSensorProvider,
};
use crate::trend::TrendAndPatternAnalyzer;
use crate::types::{
    Consent, DailyMetrics, DailyWellnessRecord, InteractionEvent, SensorSleepSession,
    SleepEstimate, SleepWindow, TrendSummary, WellnessAlert,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Resolve one night's sleep with default settings.
///
/// # Example
/// ```ignore
/// let estimate = resolve_sleep(night, &SleepWindow::default(), None, &events);
/// ```
pub fn resolve_sleep(
    night: NaiveDate,
    window: &SleepWindow,
    sensor_session: Option<&SensorSleepSession>,
    events: &[InteractionEvent],
) -> SleepEstimate {
    SleepSignalResolver::default().resolve(night, window, sensor_session, events)
}

/// Composite 0-100 score for one day
pub fn score_day(metrics: &DailyMetrics) -> u8 {
    CompositeScorer::score(metrics)
}

/// Decline alerts for a history snapshot
pub fn evaluate_anomalies(history: &[DailyWellnessRecord]) -> Vec<WellnessAlert> {
    BaselineAnomalyDetector::default().evaluate(history)
}

/// Week-over-week trends and patterns for a history snapshot
pub fn analyze_trend(history: &[DailyWellnessRecord]) -> TrendSummary {
    TrendAndPatternAnalyzer::default().analyze(history)
}

// ============================================================================
// JSON entry points (FFI and CLI)
// ============================================================================

/// Input for [`resolve_sleep_json`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRequest {
    pub night: NaiveDate,
    /// Falls back to the resolver's configured window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<SleepWindow>,
    #[serde(default)]
    pub sensor_session: Option<SensorSleepSession>,
    #[serde(default)]
    pub events: Vec<InteractionEvent>,
}

impl SleepRequest {
    pub fn resolve(&self, resolver: &SleepSignalResolver) -> SleepEstimate {
        let window = self.window.unwrap_or(resolver.config().window);
        resolver.resolve(
            self.night,
            &window,
            self.sensor_session.as_ref(),
            &self.events,
        )
    }
}

/// Output of [`score_day_json`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayScore {
    pub date: NaiveDate,
    pub wellness_score: u8,
    pub sub_scores: SubScores,
}

impl DayScore {
    pub fn from_metrics(metrics: &DailyMetrics) -> Self {
        let sub_scores = CompositeScorer::sub_scores(metrics);
        Self {
            date: metrics.date,
            wellness_score: sub_scores.total(),
            sub_scores,
        }
    }
}

/// Score a `DailyMetrics` JSON object
pub fn score_day_json(metrics_json: &str) -> Result<String, WellnessError> {
    let metrics: DailyMetrics = serde_json::from_str(metrics_json)?;
    Ok(serde_json::to_string(&DayScore::from_metrics(&metrics))?)
}

/// Resolve sleep from a [`SleepRequest`] JSON object with default settings
pub fn resolve_sleep_json(request_json: &str) -> Result<String, WellnessError> {
    resolve_sleep_json_with(&SleepSignalResolver::default(), request_json)
}

/// Resolve sleep from a [`SleepRequest`] JSON object.
///
/// A request without a window uses the resolver's configured one.
pub fn resolve_sleep_json_with(
    resolver: &SleepSignalResolver,
    request_json: &str,
) -> Result<String, WellnessError> {
    let request: SleepRequest = serde_json::from_str(request_json)?;
    Ok(serde_json::to_string(&request.resolve(resolver))?)
}

/// Evaluate a JSON array of history records, returning a JSON array of alerts
pub fn evaluate_anomalies_json(history_json: &str) -> Result<String, WellnessError> {
    let history: Vec<DailyWellnessRecord> = serde_json::from_str(history_json)?;
    Ok(serde_json::to_string(&evaluate_anomalies(&history))?)
}

/// Analyze a JSON array of history records, returning a trend summary
pub fn analyze_trend_json(history_json: &str) -> Result<String, WellnessError> {
    let history: Vec<DailyWellnessRecord> = serde_json::from_str(history_json)?;
    Ok(serde_json::to_string(&analyze_trend(&history))?)
}

// ============================================================================
// Stateful processor
// ============================================================================

/// Result of one metrics submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub record: DailyWellnessRecord,
    /// History length the detector saw
    pub history_days: usize,
    pub alerts: Vec<WellnessAlert>,
    pub dispatch: Vec<DispatchOutcome>,
}

/// Stateful processor with injected collaborators.
///
/// Defaults to in-memory history, no sensor, no interaction events and a
/// dispatcher that stores alerts locally without forwarding.
pub struct WellnessProcessor {
    config: WellnessConfig,
    history: Box<dyn HistoryStore>,
    sensor: Box<dyn SensorProvider>,
    events: Box<dyn EventSource>,
    dispatcher: AlertDispatcher,
    resolver: SleepSignalResolver,
    detector: BaselineAnomalyDetector,
    analyzer: TrendAndPatternAnalyzer,
}

impl Default for WellnessProcessor {
    fn default() -> Self {
        Self::new(WellnessConfig::default())
    }
}

impl WellnessProcessor {
    pub fn new(config: WellnessConfig) -> Self {
        Self {
            resolver: SleepSignalResolver::new(config.sleep.clone()),
            detector: BaselineAnomalyDetector::new(config.anomaly.clone()),
            analyzer: TrendAndPatternAnalyzer::new(config.trend.clone()),
            config,
            history: Box::new(MemoryHistoryStore::new()),
            sensor: Box::new(StaticSensorProvider::empty()),
            events: Box::new(StaticEventSource::default()),
            dispatcher: AlertDispatcher::default(),
        }
    }

    pub fn with_history_store(mut self, store: Box<dyn HistoryStore>) -> Self {
        self.history = store;
        self
    }

    pub fn with_sensor_provider(mut self, sensor: Box<dyn SensorProvider>) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_event_source(mut self, events: Box<dyn EventSource>) -> Self {
        self.events = events;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: AlertDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &WellnessConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Score, store, evaluate and dispatch one day.
    ///
    /// Only a failed upsert is returned as an error. A failed history read
    /// afterwards is logged and evaluated as empty history, and dispatch
    /// failures never surface here.
    pub fn submit_metrics(
        &mut self,
        metrics: DailyMetrics,
        consent: Consent,
    ) -> Result<SubmissionReport, WellnessError> {
        let record = CompositeScorer::score_record(metrics);
        debug!(date = %record.date(), score = record.wellness_score, "scored day");

        self.history.upsert(record.clone())?;

        let history = match self.history.get_history(self.config.history_limit_days) {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "failed to read history, skipping anomaly evaluation");
                Vec::new()
            }
        };

        let alerts = self.detector.evaluate(&history);
        let dispatch = alerts
            .iter()
            .map(|alert| self.dispatcher.dispatch(alert.clone(), consent))
            .collect();

        Ok(SubmissionReport {
            record,
            history_days: history.len(),
            alerts,
            dispatch,
        })
    }

    /// Resolve sleep for `night` from the configured sensor and event source
    pub fn resolve_sleep_for(&self, night: NaiveDate) -> SleepEstimate {
        self.resolver.resolve_from_sources(
            night,
            &self.config.sleep.window,
            self.sensor.as_ref(),
            self.events.as_ref(),
        )
    }

    /// Trend summary over the configured history window
    pub fn trend_summary(&self) -> Result<TrendSummary, WellnessError> {
        let history = self.history.get_history(self.config.history_limit_days)?;
        Ok(self.analyzer.analyze(&history))
    }

    pub fn acknowledge_alert(&mut self, alert_id: &str) -> Result<(), WellnessError> {
        self.dispatcher.acknowledge(alert_id)
    }

    /// Locally stored alerts, oldest first
    pub fn alerts(&self) -> Result<Vec<WellnessAlert>, WellnessError> {
        self.dispatcher.store().alerts()
    }

    /// Upsert every record from a JSON array into the history store
    pub fn load_history(&mut self, json: &str) -> Result<usize, WellnessError> {
        let records: Vec<DailyWellnessRecord> = serde_json::from_str(json)?;
        let count = records.len();
        for record in records {
            self.history.upsert(record)?;
        }
        Ok(count)
    }

    /// Full history as a JSON array, newest first
    pub fn export_history(&self) -> Result<String, WellnessError> {
        let history = self.history.get_history(usize::MAX)?;
        Ok(serde_json::to_string(&history)?)
    }
}
