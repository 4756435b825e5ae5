//! Synheart Wellness - On-device wellness scoring and decline detection
//!
//! Turns a day's behavioral inputs (sleep, mood, screen time, activity) into a
//! bounded wellness score, keeps a date-keyed history of those scores, and
//! watches the history for sustained declines against a personal baseline:
//! sleep resolution → composite scoring → history upsert → anomaly
//! evaluation → alert dispatch.
//!
//! ## Modules
//!
//! - **Sleep**: Resolve nightly sleep from a sensor session or inactivity gaps
//! - **Scoring**: Composite 0-100 daily score
//! - **Anomaly**: Baseline decline detection
//! - **Trend**: Week-over-week trends and recurring patterns
//! - **Dispatch**: Local alert storage and consent-aware forwarding

pub mod anomaly;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod sleep;
pub mod store;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::WellnessConfig;
pub use error::WellnessError;
pub use pipeline::{
    analyze_trend, evaluate_anomalies, resolve_sleep, score_day, SubmissionReport,
    WellnessProcessor,
};
pub use types::{
    Consent, DailyMetrics, DailyWellnessRecord, SleepEstimate, TrendSummary, WellnessAlert,
};

/// Library version
pub const WELLNESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "synheart-wellness";
