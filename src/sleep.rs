//! Sleep signal resolution
//!
//! Resolves a night's sleep duration and confidence from one of two sources:
//!
//! - a sensor-reported sleep session (preferred when a sensor is connected)
//! - inactivity inference over raw device-interaction timestamps
//!
//! The two paths are never blended. A sensor reading is taken as-is; only
//! when it is missing, empty, or the sensor source is disabled does the
//! resolver fall back to inactivity inference.

use crate::config::SleepConfig;
use crate::store::{EventSource, SensorProvider};
use crate::types::{
    InteractionEvent, SensorSleepSession, SleepEstimate, SleepSource, SleepWindow,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use tracing::{debug, warn};

/// Resolver for nightly sleep estimates
#[derive(Debug, Clone)]
pub struct SleepSignalResolver {
    config: SleepConfig,
}

impl Default for SleepSignalResolver {
    fn default() -> Self {
        Self::new(SleepConfig::default())
    }
}

impl SleepSignalResolver {
    pub fn new(config: SleepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SleepConfig {
        &self.config
    }

    /// Resolve sleep for `night` from an optional sensor session and raw events
    pub fn resolve(
        &self,
        night: NaiveDate,
        window: &SleepWindow,
        sensor_session: Option<&SensorSleepSession>,
        events: &[InteractionEvent],
    ) -> SleepEstimate {
        if self.config.sensor_enabled {
            if let Some(session) = sensor_session.filter(|s| s.duration_minutes > 0.0) {
                debug!(night = %night, minutes = session.duration_minutes, "using sensor sleep session");
                return SleepEstimate {
                    source: SleepSource::Sensor,
                    minutes: session.duration_minutes.round() as u32,
                    // Non-finite readings count as unreported
                    confidence: session
                        .confidence
                        .filter(|c| c.is_finite())
                        .unwrap_or(self.config.sensor_default_confidence)
                        .clamp(0.0, 1.0),
                };
            }
        }

        let (window_start, window_end) = window_bounds(night, window, self.offset());
        self.infer_from_inactivity(window_start, window_end, events)
    }

    /// Read the collaborators once and resolve.
    ///
    /// A failing sensor or event source is treated as "no data".
    pub fn resolve_from_sources(
        &self,
        night: NaiveDate,
        window: &SleepWindow,
        sensor: &dyn SensorProvider,
        event_source: &dyn EventSource,
    ) -> SleepEstimate {
        let (window_start, window_end) = window_bounds(night, window, self.offset());

        let session = if self.config.sensor_enabled {
            match sensor.read_most_recent_sleep_session(window_start, window_end) {
                Ok(session) => session,
                Err(e) => {
                    warn!(night = %night, error = %e, "sensor read failed, falling back to inactivity");
                    None
                }
            }
        } else {
            None
        };

        let events = match event_source.get_interaction_events(night) {
            Ok(events) => events,
            Err(e) => {
                warn!(night = %night, error = %e, "interaction events unavailable");
                Vec::new()
            }
        };

        self.resolve(night, window, session.as_ref(), &events)
    }

    /// Window bounds for a night in UTC, using the configured offset
    pub fn bounds(&self, night: NaiveDate, window: &SleepWindow) -> (DateTime<Utc>, DateTime<Utc>) {
        window_bounds(night, window, self.offset())
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    fn infer_from_inactivity(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        events: &[InteractionEvent],
    ) -> SleepEstimate {
        if events.is_empty() {
            return SleepEstimate {
                source: SleepSource::Inactivity,
                minutes: 0,
                confidence: 0.0,
            };
        }

        let window_minutes = minutes_between(window_start, window_end);

        let mut in_window: Vec<DateTime<Utc>> = events
            .iter()
            .map(|e| e.timestamp)
            .filter(|t| *t >= window_start && *t <= window_end)
            .collect();
        in_window.sort();

        let settling = self.config.settling_minutes;
        let mut last_active = window_start;
        let mut sleep_minutes = 0.0;

        for time in in_window {
            sleep_minutes += sleep_credit(minutes_between(last_active, time), settling);
            last_active = time;
        }
        sleep_minutes += sleep_credit(minutes_between(last_active, window_end), settling);

        let sleep_minutes = sleep_minutes.clamp(0.0, window_minutes);
        let confidence = if window_minutes > 0.0 {
            (sleep_minutes / window_minutes).min(self.config.inactivity_confidence_cap)
        } else {
            0.0
        };

        SleepEstimate {
            source: SleepSource::Inactivity,
            minutes: sleep_minutes.round() as u32,
            confidence,
        }
    }
}

/// Compute the UTC bounds of a night's window.
///
/// The start is `night` at `window.start` local time; the end rolls to the
/// next day whenever `window.end <= window.start`.
pub fn window_bounds(
    night: NaiveDate,
    window: &SleepWindow,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let mut end_date = night;
    if window.is_overnight() {
        end_date = night.succ_opt().unwrap_or(night);
    }

    let to_utc = |date: NaiveDate, time: NaiveTime| {
        let local = date.and_time(time);
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    };

    (to_utc(night, window.start), to_utc(end_date, window.end))
}

/// Minutes of sleep credited for one inactivity gap
fn sleep_credit(gap_minutes: f64, settling_minutes: f64) -> f64 {
    if gap_minutes >= settling_minutes {
        gap_minutes - settling_minutes
    } else {
        0.0
    }
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta: Duration = to - from;
    delta.num_milliseconds() as f64 / 60_000.0
}
