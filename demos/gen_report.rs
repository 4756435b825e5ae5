//! Generate a submission report stream for validation testing
//!
//! Each night's phone activity goes through the sleep resolver before the
//! day is scored, so the stream exercises events → sleep estimate → score.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use synheart_wellness::types::{InteractionEvent, SleepWindow};
use synheart_wellness::{resolve_sleep, Consent, DailyMetrics, WellnessProcessor};

/// Phone activity every 30 minutes from 22:00 until `last_use`, then once on waking
fn night_events(night: NaiveDate, last_use: Duration) -> Vec<InteractionEvent> {
    let start: DateTime<Utc> = night.and_time(NaiveTime::MIN).and_utc() + Duration::hours(22);
    let mut events: Vec<InteractionEvent> = (0..=last_use.num_minutes() / 30)
        .map(|i| InteractionEvent::new(start + Duration::minutes(30 * i)))
        .collect();
    events.push(InteractionEvent::new(start + Duration::hours(9)));
    events
}

fn main() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let window = SleepWindow::default();
    let mut processor = WellnessProcessor::default();
    let consent = Consent {
        usage_tracking: true,
    };

    // Two steady weeks, then a slide
    for day in 0..21 {
        let date = start + Duration::days(day);
        let steady = day < 16;

        // Steady nights put the phone down by 23:00, late ones scroll until 03:00
        let last_use = if steady {
            Duration::hours(1)
        } else {
            Duration::hours(5)
        };
        let estimate = resolve_sleep(date, &window, None, &night_events(date, last_use));

        let metrics = DailyMetrics::new(date).with_sleep_estimate(&estimate);
        let metrics = if steady {
            metrics
                .with_mood(4.0)
                .with_screen_time(180.0)
                .with_activity(35.0)
        } else {
            metrics
                .with_mood(1.5)
                .with_screen_time(520.0)
                .with_activity(0.0)
        };

        match processor.submit_metrics(metrics, consent) {
            Ok(report) => match serde_json::to_string(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e:?}"),
            },
            Err(e) => eprintln!("Error: {e:?}"),
        }
    }

    match processor.trend_summary() {
        Ok(summary) => {
            for pattern in &summary.patterns {
                eprintln!("{}", pattern.description());
            }
        }
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
