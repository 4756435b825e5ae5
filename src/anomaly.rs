//! Baseline anomaly detection
//!
//! Compares short-term wellness averages against a rolling personal baseline
//! and raises decline alerts. History is read newest-first:
//!
//! ```text
//! index:  0  1  2 | 3  4  5  6 | 7 ... 16
//!         recent  |            |
//!         week ----------------|
//!                 | baseline ------------
//! ```
//!
//! - baseline: 14 records starting 3 days back
//! - recent (3 days) at or below -20% of baseline -> `wellness_decline` (medium)
//! - week (7 days) at or below -20% of baseline -> `prolonged_decline` (high)
//!
//! The two checks are independent and may both fire. Re-evaluating an
//! unchanged history re-emits the same alerts.

use crate::config::AnomalyConfig;
use crate::types::{AlertSeverity, AlertType, DailyWellnessRecord, WellnessAlert};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Averages computed for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub baseline_average: f64,
    pub recent_average: f64,
    pub week_average: f64,
    /// Recent vs baseline, percent
    pub recent_change_pct: f64,
    /// Week vs baseline, percent
    pub week_change_pct: f64,
    /// Records that contributed to the baseline
    pub baseline_days: usize,
}

/// Detector for sustained wellness declines
#[derive(Debug, Clone, Default)]
pub struct BaselineAnomalyDetector {
    config: AnomalyConfig,
}

impl BaselineAnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Evaluate history and stamp alerts with the current time
    pub fn evaluate(&self, history: &[DailyWellnessRecord]) -> Vec<WellnessAlert> {
        self.evaluate_at(history, Utc::now())
    }

    /// Evaluate history, stamping alerts with `now`
    pub fn evaluate_at(
        &self,
        history: &[DailyWellnessRecord],
        now: DateTime<Utc>,
    ) -> Vec<WellnessAlert> {
        let Some(snapshot) = self.snapshot(history) else {
            return Vec::new();
        };

        let mut alerts = Vec::new();
        let threshold = self.config.decline_threshold_pct;

        if snapshot.recent_change_pct <= threshold {
            alerts.push(build_alert(
                AlertType::WellnessDecline,
                AlertSeverity::Medium,
                snapshot.baseline_average,
                snapshot.recent_average,
                snapshot.recent_change_pct,
                now,
            ));
        }

        if snapshot.week_change_pct <= threshold {
            alerts.push(build_alert(
                AlertType::ProlongedDecline,
                AlertSeverity::High,
                snapshot.baseline_average,
                snapshot.week_average,
                snapshot.week_change_pct,
                now,
            ));
        }

        debug!(
            baseline = snapshot.baseline_average,
            recent_change = snapshot.recent_change_pct,
            week_change = snapshot.week_change_pct,
            alerts = alerts.len(),
            "anomaly evaluation complete"
        );

        alerts
    }

    /// Compute baseline and short-term averages.
    ///
    /// Returns `None` when history is too short or the baseline averages to
    /// zero (a percentage change against zero is undefined).
    pub fn snapshot(&self, history: &[DailyWellnessRecord]) -> Option<BaselineSnapshot> {
        let cfg = &self.config;
        if history.len() < cfg.min_history_days {
            return None;
        }

        let mut scores: Vec<(chrono::NaiveDate, f64)> = history
            .iter()
            .map(|r| (r.date(), r.wellness_score as f64))
            .collect();
        scores.sort_by(|a, b| b.0.cmp(&a.0));
        let scores: Vec<f64> = scores.into_iter().map(|(_, s)| s).collect();

        let baseline_end = (cfg.baseline_offset_days + cfg.baseline_days).min(scores.len());
        let baseline = scores.get(cfg.baseline_offset_days..baseline_end)?;
        let baseline_average = mean(baseline)?;
        if baseline_average == 0.0 {
            debug!("baseline average is zero, skipping anomaly evaluation");
            return None;
        }

        let recent_average = mean(&scores[..cfg.recent_days.min(scores.len())])?;
        let week_average = mean(&scores[..cfg.week_days.min(scores.len())])?;

        Some(BaselineSnapshot {
            baseline_average,
            recent_average,
            week_average,
            recent_change_pct: percent_change(recent_average, baseline_average),
            week_change_pct: percent_change(week_average, baseline_average),
            baseline_days: baseline.len(),
        })
    }
}

fn build_alert(
    alert_type: AlertType,
    severity: AlertSeverity,
    baseline: f64,
    current: f64,
    change_pct: f64,
    now: DateTime<Utc>,
) -> WellnessAlert {
    WellnessAlert {
        id: Uuid::new_v4().to_string(),
        alert_type,
        severity,
        baseline_score: baseline.round() as i64,
        current_score: current.round() as i64,
        percentage_change: change_pct.round() as i64,
        timestamp: now,
        acknowledged: false,
    }
}

fn percent_change(current: f64, baseline: f64) -> f64 {
    (current - baseline) / baseline * 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyMetrics;
    use chrono::{Duration, NaiveDate, TimeZone};

    /// Build newest-first history from scores (index 0 = today)
    fn history(scores: &[u8]) -> Vec<DailyWellnessRecord> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| DailyWellnessRecord {
                wellness_score: score,
                metrics: DailyMetrics::new(today - Duration::days(i as i64)),
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_insufficient_history() {
        let detector = BaselineAnomalyDetector::default();
        for len in 0..14 {
            let h = history(&vec![10; len]);
            assert!(detector.evaluate_at(&h, now()).is_empty());
        }
    }

    #[test]
    fn test_short_term_decline() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![54u8; 3];
        scores.extend(vec![70u8; 14]);
        let alerts = detector.evaluate_at(&history(&scores), now());

        // Week average is (3*54 + 4*70)/7 = 63.1, only -9.8%
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.alert_type, AlertType::WellnessDecline);
        assert_eq!(alert.severity, AlertSeverity::Medium);
        assert_eq!(alert.baseline_score, 70);
        assert_eq!(alert.current_score, 54);
        assert_eq!(alert.percentage_change, -23);
        assert!(!alert.acknowledged);
        assert_eq!(alert.timestamp, now());
    }

    #[test]
    fn test_both_alerts_fire() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![40u8; 7];
        scores.extend(vec![70u8; 10]);
        let alerts = detector.evaluate_at(&history(&scores), now());

        // Baseline = indices 3..17 = four 40s and ten 70s = 61.43
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_type, AlertType::WellnessDecline);
        assert_eq!(alerts[1].alert_type, AlertType::ProlongedDecline);
        assert_eq!(alerts[1].severity, AlertSeverity::High);
        assert_eq!(alerts[1].baseline_score, 61);
        assert_eq!(alerts[1].current_score, 40);
        assert_eq!(alerts[1].percentage_change, -35);
        assert_ne!(alerts[0].id, alerts[1].id);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let detector = BaselineAnomalyDetector::default();
        // 3 days at 56 vs baseline 70 is exactly -20%
        let mut scores = vec![56u8; 3];
        scores.extend(vec![70u8; 14]);
        let alerts = detector.evaluate_at(&history(&scores), now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].percentage_change, -20);
    }

    #[test]
    fn test_no_alert_when_stable() {
        let detector = BaselineAnomalyDetector::default();
        let alerts = detector.evaluate_at(&history(&[70; 20]), now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_zero_baseline_is_skipped() {
        let detector = BaselineAnomalyDetector::default();
        let h = history(&[0; 17]);
        assert!(detector.snapshot(&h).is_none());
        assert!(detector.evaluate_at(&h, now()).is_empty());
    }

    #[test]
    fn test_minimum_history_uses_partial_baseline() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![50u8; 3];
        scores.extend(vec![80u8; 11]);
        let snapshot = detector.snapshot(&history(&scores)).unwrap();
        assert_eq!(snapshot.baseline_days, 11);
        assert_eq!(snapshot.baseline_average, 80.0);
    }

    #[test]
    fn test_baseline_ignores_records_beyond_window() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![70u8; 17];
        scores.extend(vec![0u8; 10]);
        let snapshot = detector.snapshot(&history(&scores)).unwrap();
        assert_eq!(snapshot.baseline_days, 14);
        assert_eq!(snapshot.baseline_average, 70.0);
    }

    #[test]
    fn test_unordered_history_is_sorted() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![54u8; 3];
        scores.extend(vec![70u8; 14]);
        let mut h = history(&scores);
        h.reverse();
        let alerts = detector.evaluate_at(&h, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_score, 54);
    }

    #[test]
    fn test_repeat_evaluation_re_emits() {
        let detector = BaselineAnomalyDetector::default();
        let mut scores = vec![54u8; 3];
        scores.extend(vec![70u8; 14]);
        let h = history(&scores);
        let first = detector.evaluate_at(&h, now());
        let second = detector.evaluate_at(&h, now());
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].alert_type, second[0].alert_type);
    }

    #[test]
    fn test_custom_threshold() {
        let detector = BaselineAnomalyDetector::new(AnomalyConfig {
            decline_threshold_pct: -10.0,
            ..AnomalyConfig::default()
        });
        let mut scores = vec![60u8; 7];
        scores.extend(vec![70u8; 10]);
        let alerts = detector.evaluate_at(&history(&scores), now());
        assert_eq!(alerts.len(), 2);
    }
}
