//! Error types for Synheart Wellness
//!
//! The scoring, sleep and anomaly algorithms are total and never fail. Errors
//! only surface at collaborator boundaries (storage, sensors, event sources,
//! alert forwarding) and when parsing external JSON.

use thiserror::Error;

/// Errors that can occur around the wellness core
#[derive(Debug, Error)]
pub enum WellnessError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("History store error: {0}")]
    Storage(String),

    #[error("Sensor provider error: {0}")]
    Sensor(String),

    #[error("Interaction event source error: {0}")]
    EventSource(String),

    #[error("Alert forwarding failed: {0}")]
    Forwarding(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),
}
