//! Core types for the wellness pipeline
//!
//! This module defines the data structures that flow between the sleep
//! resolver, the composite scorer, the anomaly detector and the trend analyzer.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Default sleep hours when none were recorded
pub const DEFAULT_SLEEP_HOURS: f64 = 7.0;

/// Default self-reported mood (0-5 scale)
pub const DEFAULT_MOOD_SCORE: f64 = 3.0;

/// Default screen time in minutes
pub const DEFAULT_SCREEN_TIME_MINUTES: f64 = 240.0;

/// Default physical activity in minutes
pub const DEFAULT_ACTIVITY_MINUTES: f64 = 0.0;

// ============================================================================
// Sleep
// ============================================================================

/// A single device-interaction instant (screen unlock, app foreground, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}

/// Nightly clock-time bounds within which inactivity counts as sleep.
///
/// When `end <= start` the end falls on the following calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    #[serde(with = "clock_time")]
    pub end: NaiveTime,
}

impl Default for SleepWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        }
    }
}

impl SleepWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether the window crosses midnight (or spans a full day)
    pub fn is_overnight(&self) -> bool {
        self.end <= self.start
    }
}

/// Sleep session reported by a health/fitness sensor collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSleepSession {
    /// Reported sleep duration in minutes
    pub duration_minutes: f64,
    /// Sensor-provided confidence (0-1), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Where a sleep estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepSource {
    Sensor,
    Inactivity,
    None,
}

impl SleepSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepSource::Sensor => "sensor",
            SleepSource::Inactivity => "inactivity",
            SleepSource::None => "none",
        }
    }
}

/// Resolved sleep for a single night
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepEstimate {
    pub source: SleepSource,
    /// Estimated sleep in whole minutes
    pub minutes: u32,
    /// Trust in the estimate (0-1)
    pub confidence: f64,
}

impl SleepEstimate {
    /// Estimate carrying no information
    pub fn empty() -> Self {
        Self {
            source: SleepSource::None,
            minutes: 0,
            confidence: 0.0,
        }
    }

    pub fn hours(&self) -> f64 {
        self.minutes as f64 / 60.0
    }
}

// ============================================================================
// Daily metrics and records
// ============================================================================

/// One calendar day of scoring input.
///
/// Fields the caller did not report stay `None`; [`DailyMetrics::resolve`]
/// substitutes the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    /// Self-reported mood, 0-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_time_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_minutes: Option<f64>,
}

/// Metrics with defaults applied; what the scorer actually consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMetrics {
    pub sleep_hours: f64,
    pub mood_score: f64,
    pub screen_time_minutes: f64,
    pub activity_minutes: f64,
}

impl DailyMetrics {
    /// Create an empty metrics bundle for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sleep_hours: None,
            mood_score: None,
            screen_time_minutes: None,
            activity_minutes: None,
        }
    }

    pub fn with_sleep_hours(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    pub fn with_mood(mut self, mood: f64) -> Self {
        self.mood_score = Some(mood);
        self
    }

    pub fn with_screen_time(mut self, minutes: f64) -> Self {
        self.screen_time_minutes = Some(minutes);
        self
    }

    pub fn with_activity(mut self, minutes: f64) -> Self {
        self.activity_minutes = Some(minutes);
        self
    }

    /// Fill sleep hours from a resolved estimate unless already reported.
    ///
    /// Zero-confidence estimates carry no measurement and are ignored.
    pub fn with_sleep_estimate(mut self, estimate: &SleepEstimate) -> Self {
        if self.sleep_hours.is_none()
            && estimate.source != SleepSource::None
            && estimate.confidence > 0.0
        {
            self.sleep_hours = Some(estimate.hours());
        }
        self
    }

    /// Apply defaults for every missing field.
    ///
    /// Non-finite values are treated as missing.
    pub fn resolve(&self) -> ResolvedMetrics {
        let pick = |value: Option<f64>, default: f64| match value {
            Some(v) if v.is_finite() => v,
            _ => default,
        };
        ResolvedMetrics {
            sleep_hours: pick(self.sleep_hours, DEFAULT_SLEEP_HOURS),
            mood_score: pick(self.mood_score, DEFAULT_MOOD_SCORE),
            screen_time_minutes: pick(self.screen_time_minutes, DEFAULT_SCREEN_TIME_MINUTES),
            activity_minutes: pick(self.activity_minutes, DEFAULT_ACTIVITY_MINUTES),
        }
    }
}

/// A scored day as kept in the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWellnessRecord {
    /// Composite score, 0-100
    pub wellness_score: u8,
    #[serde(flatten)]
    pub metrics: DailyMetrics,
}

impl DailyWellnessRecord {
    pub fn date(&self) -> NaiveDate {
        self.metrics.date
    }

    pub fn weekday(&self) -> Weekday {
        use chrono::Datelike;
        self.metrics.date.weekday()
    }
}

/// Sort records newest-first, the order every consumer of history expects
pub fn sort_newest_first(records: &mut [DailyWellnessRecord]) {
    records.sort_by(|a, b| b.date().cmp(&a.date()));
}

// ============================================================================
// Alerts
// ============================================================================

/// Kind of decline signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Recent 3-day average dropped below baseline
    WellnessDecline,
    /// Recent 7-day average dropped below baseline
    ProlongedDecline,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::WellnessDecline => "wellness_decline",
            AlertType::ProlongedDecline => "prolonged_decline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

/// Alert emitted by the anomaly detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub baseline_score: i64,
    pub current_score: i64,
    pub percentage_change: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

/// User consent flags read by the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    #[serde(default)]
    pub usage_tracking: bool,
}

// ============================================================================
// Trends and patterns
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Informational pattern surfaced to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WellnessPattern {
    /// Best and worst day of the week by mean score
    Weekly {
        best_day: Weekday,
        best_average: f64,
        worst_day: Weekday,
        worst_average: f64,
    },
    /// Lower screen time days score noticeably better
    ScreenTimeCorrelation {
        low_usage_average: f64,
        high_usage_average: f64,
        difference: f64,
    },
}

impl WellnessPattern {
    pub fn description(&self) -> String {
        match self {
            WellnessPattern::Weekly {
                best_day,
                best_average,
                worst_day,
                worst_average,
            } => format!(
                "You tend to feel best on {} (avg {:.0}) and lowest on {} (avg {:.0})",
                weekday_name(*best_day),
                best_average,
                weekday_name(*worst_day),
                worst_average
            ),
            WellnessPattern::ScreenTimeCorrelation { difference, .. } => format!(
                "Days with less screen time score {:.0} points higher on average",
                difference
            ),
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Output of the trend analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub wellness_trend: Trend,
    pub mood_trend: Trend,
    pub sleep_trend: Trend,
    pub patterns: Vec<WellnessPattern>,
}

impl TrendSummary {
    pub fn stable() -> Self {
        Self {
            wellness_trend: Trend::Stable,
            mood_trend: Trend::Stable,
            sleep_trend: Trend::Stable,
            patterns: Vec::new(),
        }
    }
}

/// Serde helpers for "HH:MM" clock times
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sleep_window() {
        let window = SleepWindow::default();
        assert_eq!(window.start, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert!(window.is_overnight());
    }

    #[test]
    fn test_sleep_window_clock_format() {
        let window: SleepWindow =
            serde_json::from_str(r#"{"start": "23:00", "end": "07:30"}"#).unwrap();
        assert_eq!(window.end, NaiveTime::from_hms_opt(7, 30, 0).unwrap());

        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start":"23:00","end":"07:30"}"#);
    }

    #[test]
    fn test_metrics_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let resolved = DailyMetrics::new(date).resolve();
        assert_eq!(resolved.sleep_hours, 7.0);
        assert_eq!(resolved.mood_score, 3.0);
        assert_eq!(resolved.screen_time_minutes, 240.0);
        assert_eq!(resolved.activity_minutes, 0.0);
    }

    #[test]
    fn test_metrics_non_finite_treated_as_missing() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let resolved = DailyMetrics::new(date).with_mood(f64::NAN).resolve();
        assert_eq!(resolved.mood_score, DEFAULT_MOOD_SCORE);
    }

    #[test]
    fn test_sleep_estimate_does_not_override_reported_sleep() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let estimate = SleepEstimate {
            source: SleepSource::Inactivity,
            minutes: 420,
            confidence: 0.85,
        };

        let filled = DailyMetrics::new(date).with_sleep_estimate(&estimate);
        assert_eq!(filled.sleep_hours, Some(7.0));

        let reported = DailyMetrics::new(date)
            .with_sleep_hours(5.0)
            .with_sleep_estimate(&estimate);
        assert_eq!(reported.sleep_hours, Some(5.0));

        let none = DailyMetrics::new(date).with_sleep_estimate(&SleepEstimate::empty());
        assert_eq!(none.sleep_hours, None);

        let no_events = SleepEstimate {
            source: SleepSource::Inactivity,
            minutes: 0,
            confidence: 0.0,
        };
        let unmeasured = DailyMetrics::new(date).with_sleep_estimate(&no_events);
        assert_eq!(unmeasured.sleep_hours, None);
    }

    #[test]
    fn test_record_flattened_serialization() {
        let json = r#"{
            "date": "2024-01-15",
            "wellness_score": 85,
            "sleep_hours": 8.0,
            "mood_score": 4.0
        }"#;
        let record: DailyWellnessRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.wellness_score, 85);
        assert_eq!(record.metrics.sleep_hours, Some(8.0));
        assert_eq!(record.metrics.screen_time_minutes, None);
        assert_eq!(record.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_alert_type_serialization() {
        let json = serde_json::to_string(&AlertType::ProlongedDecline).unwrap();
        assert_eq!(json, "\"prolonged_decline\"");
        let json = serde_json::to_string(&AlertSeverity::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records: Vec<DailyWellnessRecord> = [3, 1, 2]
            .iter()
            .map(|d| DailyWellnessRecord {
                wellness_score: 50,
                metrics: DailyMetrics::new(NaiveDate::from_ymd_opt(2024, 1, *d).unwrap()),
            })
            .collect();
        sort_newest_first(&mut records);
        let days: Vec<u32> = records
            .iter()
            .map(|r| chrono::Datelike::day(&r.date()))
            .collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[test]
    fn test_pattern_description() {
        let pattern = WellnessPattern::Weekly {
            best_day: Weekday::Sat,
            best_average: 82.4,
            worst_day: Weekday::Mon,
            worst_average: 61.0,
        };
        assert_eq!(
            pattern.description(),
            "You tend to feel best on Saturday (avg 82) and lowest on Monday (avg 61)"
        );
    }
}
