//! Composite wellness scoring
//!
//! Maps one day's metrics to an integer 0-100 score built from four
//! sub-scores of up to 25 points each:
//!
//! ```text
//! Sleep     7-9h -> 25, 6-10h -> 20, 5-11h -> 15, otherwise 10
//! Mood      clamp(mood, 0, 5) / 5 * 25
//! Screen    <=120m -> 25, <=240m -> 20, <=360m -> 15, <=480m -> 10, otherwise 5
//! Activity  >=60m -> 25, >=30m -> 20, >=15m -> 15, >=5m -> 10, otherwise 5
//! ```
//!
//! The lowest reachable total is 20; inputs are never rejected.

use crate::types::{DailyMetrics, DailyWellnessRecord, ResolvedMetrics};
use serde::{Deserialize, Serialize};

/// Per-component breakdown of a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub sleep: f64,
    pub mood: f64,
    pub screen_time: f64,
    pub activity: f64,
}

impl SubScores {
    pub fn total(&self) -> u8 {
        let sum = self.sleep + self.mood + self.screen_time + self.activity;
        sum.round().clamp(0.0, 100.0) as u8
    }
}

/// Stateless scorer for daily metrics
pub struct CompositeScorer;

impl CompositeScorer {
    /// Score one day
    pub fn score(metrics: &DailyMetrics) -> u8 {
        Self::sub_scores(metrics).total()
    }

    /// Score one day and wrap it as a history record
    pub fn score_record(metrics: DailyMetrics) -> DailyWellnessRecord {
        let wellness_score = Self::score(&metrics);
        DailyWellnessRecord {
            wellness_score,
            metrics,
        }
    }

    /// Sub-score breakdown with defaults applied
    pub fn sub_scores(metrics: &DailyMetrics) -> SubScores {
        let ResolvedMetrics {
            sleep_hours,
            mood_score,
            screen_time_minutes,
            activity_minutes,
        } = metrics.resolve();

        SubScores {
            sleep: sleep_score(sleep_hours),
            mood: mood_score_points(mood_score),
            screen_time: screen_time_score(screen_time_minutes),
            activity: activity_score(activity_minutes),
        }
    }
}

fn sleep_score(hours: f64) -> f64 {
    if (7.0..=9.0).contains(&hours) {
        25.0
    } else if (6.0..=10.0).contains(&hours) {
        20.0
    } else if (5.0..=11.0).contains(&hours) {
        15.0
    } else {
        10.0
    }
}

fn mood_score_points(mood: f64) -> f64 {
    mood.clamp(0.0, 5.0) / 5.0 * 25.0
}

fn screen_time_score(minutes: f64) -> f64 {
    if minutes <= 120.0 {
        25.0
    } else if minutes <= 240.0 {
        20.0
    } else if minutes <= 360.0 {
        15.0
    } else if minutes <= 480.0 {
        10.0
    } else {
        5.0
    }
}

fn activity_score(minutes: f64) -> f64 {
    if minutes >= 60.0 {
        25.0
    } else if minutes >= 30.0 {
        20.0
    } else if minutes >= 15.0 {
        15.0
    } else if minutes >= 5.0 {
        10.0
    } else {
        5.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day() -> DailyMetrics {
        DailyMetrics::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    #[test]
    fn test_sleep_band_boundaries() {
        assert_eq!(sleep_score(7.0), 25.0);
        assert_eq!(sleep_score(9.0), 25.0);
        assert_eq!(sleep_score(9.5), 20.0);
        assert_eq!(sleep_score(6.0), 20.0);
        assert_eq!(sleep_score(10.5), 15.0);
        assert_eq!(sleep_score(5.0), 15.0);
        assert_eq!(sleep_score(12.0), 10.0);
        assert_eq!(sleep_score(3.0), 10.0);
    }

    #[test]
    fn test_screen_time_bands() {
        assert_eq!(screen_time_score(0.0), 25.0);
        assert_eq!(screen_time_score(120.0), 25.0);
        assert_eq!(screen_time_score(121.0), 20.0);
        assert_eq!(screen_time_score(360.0), 15.0);
        assert_eq!(screen_time_score(480.0), 10.0);
        assert_eq!(screen_time_score(481.0), 5.0);
    }

    #[test]
    fn test_activity_bands() {
        assert_eq!(activity_score(0.0), 5.0);
        assert_eq!(activity_score(4.9), 5.0);
        assert_eq!(activity_score(5.0), 10.0);
        assert_eq!(activity_score(15.0), 15.0);
        assert_eq!(activity_score(30.0), 20.0);
        assert_eq!(activity_score(60.0), 25.0);
    }

    #[test]
    fn test_mood_is_clamped() {
        assert_eq!(mood_score_points(-2.0), 0.0);
        assert_eq!(mood_score_points(2.5), 12.5);
        assert_eq!(mood_score_points(9.0), 25.0);
    }

    #[test]
    fn test_scenario_healthy_day() {
        let metrics = day()
            .with_sleep_hours(8.0)
            .with_mood(4.0)
            .with_screen_time(150.0)
            .with_activity(45.0);

        assert_eq!(
            CompositeScorer::sub_scores(&metrics),
            SubScores {
                sleep: 25.0,
                mood: 20.0,
                screen_time: 20.0,
                activity: 20.0,
            }
        );
        assert_eq!(CompositeScorer::score(&metrics), 85);
    }

    #[test]
    fn test_scenario_poor_day() {
        let metrics = day()
            .with_sleep_hours(5.5)
            .with_mood(1.0)
            .with_screen_time(500.0)
            .with_activity(0.0);

        assert_eq!(
            CompositeScorer::sub_scores(&metrics),
            SubScores {
                sleep: 15.0,
                mood: 5.0,
                screen_time: 5.0,
                activity: 5.0,
            }
        );
        assert_eq!(CompositeScorer::score(&metrics), 30);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        // 7h sleep -> 25, mood 3 -> 15, 240m -> 20, 0m -> 5
        assert_eq!(CompositeScorer::score(&day()), 65);
    }

    #[test]
    fn test_score_bounds() {
        let worst = day()
            .with_sleep_hours(0.0)
            .with_mood(0.0)
            .with_screen_time(1000.0)
            .with_activity(0.0);
        assert_eq!(CompositeScorer::score(&worst), 20);

        let best = day()
            .with_sleep_hours(8.0)
            .with_mood(5.0)
            .with_screen_time(30.0)
            .with_activity(90.0);
        assert_eq!(CompositeScorer::score(&best), 100);

        for sleep in [0.0, 4.5, 6.5, 8.0, 10.5, 14.0] {
            for mood in [-1.0, 0.0, 1.7, 3.3, 5.0, 7.0] {
                for screen in [0.0, 200.0, 400.0, 900.0] {
                    for activity in [0.0, 10.0, 45.0, 120.0] {
                        let m = day()
                            .with_sleep_hours(sleep)
                            .with_mood(mood)
                            .with_screen_time(screen)
                            .with_activity(activity);
                        let score = CompositeScorer::score(&m);
                        assert!((20..=100).contains(&score), "score {} out of range", score);
                    }
                }
            }
        }
    }

    #[test]
    fn test_half_point_mood_rounds_up() {
        // 25 + 12.5 + 20 + 5 = 62.5
        let metrics = day().with_mood(2.5);
        assert_eq!(CompositeScorer::score(&metrics), 63);
    }

    #[test]
    fn test_score_record_keeps_metrics() {
        let metrics = day().with_mood(4.0);
        let record = CompositeScorer::score_record(metrics.clone());
        assert_eq!(record.metrics, metrics);
        assert_eq!(record.wellness_score, 70);
    }
}
