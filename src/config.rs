//! Tunable thresholds for the wellness core
//!
//! Every field has a default matching the reference behavior, so an empty
//! JSON object (or no config file at all) yields the standard pipeline.

use crate::error::WellnessError;
use crate::types::SleepWindow;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of days of history read for evaluation
pub const DEFAULT_HISTORY_LIMIT_DAYS: usize = 30;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WellnessConfig {
    pub sleep: SleepConfig,
    pub anomaly: AnomalyConfig,
    pub trend: TrendConfig,
    /// How many days of history the processor reads per evaluation
    pub history_limit_days: usize,
}

impl Default for WellnessConfig {
    fn default() -> Self {
        Self {
            sleep: SleepConfig::default(),
            anomaly: AnomalyConfig::default(),
            trend: TrendConfig::default(),
            history_limit_days: DEFAULT_HISTORY_LIMIT_DAYS,
        }
    }
}

/// Sleep resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Nightly window used when the user has not configured one
    pub window: SleepWindow,
    /// Whether a health/fitness sensor source is connected
    pub sensor_enabled: bool,
    /// Confidence assigned to sensor sessions that carry none
    pub sensor_default_confidence: f64,
    /// Ceiling on inactivity-derived confidence
    pub inactivity_confidence_cap: f64,
    /// Minutes at the start of every gap that never count as sleep
    pub settling_minutes: f64,
    /// Offset of the user's local clock from UTC, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            window: SleepWindow::default(),
            sensor_enabled: true,
            sensor_default_confidence: 0.95,
            inactivity_confidence_cap: 0.85,
            settling_minutes: 30.0,
            utc_offset_minutes: 0,
        }
    }
}

/// Baseline anomaly detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Records required before any evaluation happens
    pub min_history_days: usize,
    /// Most recent days excluded from the baseline
    pub baseline_offset_days: usize,
    /// Length of the baseline window
    pub baseline_days: usize,
    /// Days averaged for the short-term decline check
    pub recent_days: usize,
    /// Days averaged for the prolonged decline check
    pub week_days: usize,
    /// Percentage change at or below which an alert fires
    pub decline_threshold_pct: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_history_days: 14,
            baseline_offset_days: 3,
            baseline_days: 14,
            recent_days: 3,
            week_days: 7,
            decline_threshold_pct: -20.0,
        }
    }
}

/// Trend and pattern settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Records per comparison period
    pub period_days: usize,
    /// Score delta treated as a real change
    pub score_threshold: f64,
    /// Mood delta treated as a real change
    pub mood_threshold: f64,
    /// Sleep-hours delta treated as a real change
    pub sleep_threshold: f64,
    /// Records required for the day-of-week pattern
    pub weekly_pattern_min_days: usize,
    /// Days with reported screen time required for the usage correlation
    pub correlation_min_days: usize,
    /// Score advantage of low-usage days required to report the correlation
    pub correlation_min_difference: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            period_days: 7,
            score_threshold: 5.0,
            mood_threshold: 0.5,
            sleep_threshold: 0.5,
            weekly_pattern_min_days: 14,
            correlation_min_days: 5,
            correlation_min_difference: 10.0,
        }
    }
}

impl WellnessConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, WellnessError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, WellnessError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WellnessError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject settings that would make the algorithms meaningless
    pub fn validate(&self) -> Result<(), WellnessError> {
        let sleep = &self.sleep;
        if !(0.0..=1.0).contains(&sleep.sensor_default_confidence) {
            return Err(WellnessError::Config(
                "sleep.sensor_default_confidence must be within 0-1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&sleep.inactivity_confidence_cap) {
            return Err(WellnessError::Config(
                "sleep.inactivity_confidence_cap must be within 0-1".to_string(),
            ));
        }
        if sleep.settling_minutes < 0.0 {
            return Err(WellnessError::Config(
                "sleep.settling_minutes must not be negative".to_string(),
            ));
        }
        if sleep.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(WellnessError::Config(
                "sleep.utc_offset_minutes must be less than a day".to_string(),
            ));
        }

        let anomaly = &self.anomaly;
        if anomaly.recent_days == 0 || anomaly.week_days == 0 || anomaly.baseline_days == 0 {
            return Err(WellnessError::Config(
                "anomaly window sizes must be positive".to_string(),
            ));
        }
        if anomaly.decline_threshold_pct >= 0.0 {
            return Err(WellnessError::Config(
                "anomaly.decline_threshold_pct must be negative".to_string(),
            ));
        }

        if self.trend.period_days == 0 {
            return Err(WellnessError::Config(
                "trend.period_days must be positive".to_string(),
            ));
        }
        if self.history_limit_days == 0 {
            return Err(WellnessError::Config(
                "history_limit_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = WellnessConfig::from_json("{}").unwrap();
        assert_eq!(config.anomaly.min_history_days, 14);
        assert_eq!(config.anomaly.decline_threshold_pct, -20.0);
        assert_eq!(config.sleep.settling_minutes, 30.0);
        assert_eq!(config.trend.correlation_min_days, 5);
        assert_eq!(config.history_limit_days, DEFAULT_HISTORY_LIMIT_DAYS);
    }

    #[test]
    fn test_partial_override() {
        let config = WellnessConfig::from_json(
            r#"{"sleep": {"window": {"start": "23:00", "end": "07:00"}, "sensor_enabled": false}}"#,
        )
        .unwrap();
        assert!(!config.sleep.sensor_enabled);
        assert_eq!(config.sleep.window.start.format("%H:%M").to_string(), "23:00");
        assert_eq!(config.sleep.inactivity_confidence_cap, 0.85);
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let result =
            WellnessConfig::from_json(r#"{"sleep": {"inactivity_confidence_cap": 1.5}}"#);
        assert!(matches!(result, Err(WellnessError::Config(_))));
    }

    #[test]
    fn test_positive_threshold_rejected() {
        let result = WellnessConfig::from_json(r#"{"anomaly": {"decline_threshold_pct": 20.0}}"#);
        assert!(matches!(result, Err(WellnessError::Config(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = WellnessConfig::default();
        let json = config.to_json().unwrap();
        let loaded = WellnessConfig::from_json(&json).unwrap();
        assert_eq!(loaded.sleep.window, config.sleep.window);
    }
}
