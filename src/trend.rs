//! Trend and pattern analysis
//!
//! Produces user-facing insight: whether wellness, mood and sleep are
//! improving or declining week over week, which weekday tends to be best and
//! worst, and whether heavy screen-time days score lower. Informational only;
//! nothing here gates alerts.

use crate::config::TrendConfig;
use crate::types::{DailyWellnessRecord, Trend, TrendSummary, WellnessPattern};
use chrono::Weekday;
use std::collections::BTreeMap;

/// Analyzer for week-over-week trends and recurring patterns
#[derive(Debug, Clone, Default)]
pub struct TrendAndPatternAnalyzer {
    config: TrendConfig,
}

impl TrendAndPatternAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Analyze history (any order; sorted newest-first internally)
    pub fn analyze(&self, history: &[DailyWellnessRecord]) -> TrendSummary {
        let period = self.config.period_days;
        if history.len() < period {
            return TrendSummary::stable();
        }

        let mut sorted = history.to_vec();
        crate::types::sort_newest_first(&mut sorted);

        let recent = &sorted[..period];
        let older = &sorted[period..(2 * period).min(sorted.len())];

        let wellness_trend = compare(
            mean(recent.iter().map(|r| r.wellness_score as f64)),
            mean(older.iter().map(|r| r.wellness_score as f64)),
            self.config.score_threshold,
        );
        let mood_trend = compare(
            mean(recent.iter().filter_map(|r| r.metrics.mood_score)),
            mean(older.iter().filter_map(|r| r.metrics.mood_score)),
            self.config.mood_threshold,
        );
        let sleep_trend = compare(
            mean(recent.iter().filter_map(|r| r.metrics.sleep_hours)),
            mean(older.iter().filter_map(|r| r.metrics.sleep_hours)),
            self.config.sleep_threshold,
        );

        let mut patterns = Vec::new();
        if let Some(weekly) = self.weekly_pattern(&sorted) {
            patterns.push(weekly);
        }
        if let Some(correlation) = self.screen_time_correlation(&sorted) {
            patterns.push(correlation);
        }

        TrendSummary {
            wellness_trend,
            mood_trend,
            sleep_trend,
            patterns,
        }
    }

    /// Best and worst weekday by mean score
    fn weekly_pattern(&self, history: &[DailyWellnessRecord]) -> Option<WellnessPattern> {
        if history.len() < self.config.weekly_pattern_min_days {
            return None;
        }

        let mut by_day: BTreeMap<u32, (Weekday, f64, usize)> = BTreeMap::new();
        for record in history {
            let day = record.weekday();
            let entry = by_day
                .entry(day.num_days_from_monday())
                .or_insert((day, 0.0, 0));
            entry.1 += record.wellness_score as f64;
            entry.2 += 1;
        }

        let averages: Vec<(Weekday, f64)> = by_day
            .into_values()
            .map(|(day, sum, count)| (day, sum / count as f64))
            .collect();

        // Ties resolve to the earliest weekday
        let (best_day, best_average) = averages
            .iter()
            .copied()
            .fold(None, |best: Option<(Weekday, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })?;
        let (worst_day, worst_average) = averages
            .iter()
            .copied()
            .fold(None, |worst: Option<(Weekday, f64)>, cur| match worst {
                Some(w) if w.1 <= cur.1 => Some(w),
                _ => Some(cur),
            })?;

        Some(WellnessPattern::Weekly {
            best_day,
            best_average,
            worst_day,
            worst_average,
        })
    }

    /// Report when low screen-time days score clearly better
    fn screen_time_correlation(&self, history: &[DailyWellnessRecord]) -> Option<WellnessPattern> {
        let paired: Vec<(f64, f64)> = history
            .iter()
            .filter_map(|r| {
                r.metrics
                    .screen_time_minutes
                    .filter(|m| m.is_finite())
                    .map(|m| (m, r.wellness_score as f64))
            })
            .collect();
        if paired.len() < self.config.correlation_min_days {
            return None;
        }

        let average_usage = mean(paired.iter().map(|(usage, _)| *usage))?;
        let (high, low): (Vec<&(f64, f64)>, Vec<&(f64, f64)>) =
            paired.iter().partition(|(usage, _)| *usage > average_usage);

        let high_usage_average = mean(high.iter().map(|(_, score)| *score))?;
        let low_usage_average = mean(low.iter().map(|(_, score)| *score))?;
        let difference = low_usage_average - high_usage_average;

        if difference > self.config.correlation_min_difference {
            Some(WellnessPattern::ScreenTimeCorrelation {
                low_usage_average,
                high_usage_average,
                difference,
            })
        } else {
            None
        }
    }
}

/// Classify the change between two period means
fn compare(recent: Option<f64>, older: Option<f64>, threshold: f64) -> Trend {
    match (recent, older) {
        (Some(r), Some(o)) if r - o > threshold => Trend::Improving,
        (Some(r), Some(o)) if r - o < -threshold => Trend::Declining,
        _ => Trend::Stable,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
