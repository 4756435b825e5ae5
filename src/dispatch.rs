//! Alert dispatch
//!
//! Every alert is recorded locally. High-severity alerts are always forwarded
//! to the remote notification backend; medium-severity alerts only when the
//! user has consented to usage tracking. Delivery failures are logged and
//! never reach the caller that triggered scoring.

use crate::error::WellnessError;
use crate::types::{AlertSeverity, AlertType, Consent, WellnessAlert};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Local alert sink
pub trait AlertStore {
    /// Append an alert (stored unacknowledged)
    fn append_local(&mut self, alert: WellnessAlert) -> Result<(), WellnessError>;

    /// Mark an alert as acknowledged
    fn acknowledge(&mut self, alert_id: &str) -> Result<(), WellnessError>;

    /// All stored alerts, oldest first
    fn alerts(&self) -> Result<Vec<WellnessAlert>, WellnessError>;
}

/// Remote notification backend
pub trait AlertForwarder {
    fn forward(&self, trigger: &AlertTrigger) -> Result<(), WellnessError>;
}

/// Body of `POST /alerts/trigger`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTrigger {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub data: serde_json::Value,
}

impl AlertTrigger {
    pub fn from_alert(alert: &WellnessAlert) -> Self {
        Self {
            alert_type: alert.alert_type,
            severity: alert.severity,
            data: serde_json::json!({
                "alert_id": alert.id,
                "baseline_score": alert.baseline_score,
                "current_score": alert.current_score,
                "percentage_change": alert.percentage_change,
                "timestamp": alert.timestamp.to_rfc3339(),
            }),
        }
    }
}

/// What happened to the remote copy of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardStatus {
    Forwarded,
    /// Medium severity without usage-tracking consent
    SkippedNoConsent,
    Failed,
}

/// Informational result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub alert_id: String,
    pub stored_locally: bool,
    pub forward: ForwardStatus,
}

/// Records alerts locally and forwards them per severity and consent
pub struct AlertDispatcher {
    store: Box<dyn AlertStore>,
    forwarder: Box<dyn AlertForwarder>,
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new(Box::new(MemoryAlertStore::new()), Box::new(NoopForwarder))
    }
}

impl AlertDispatcher {
    pub fn new(store: Box<dyn AlertStore>, forwarder: Box<dyn AlertForwarder>) -> Self {
        Self { store, forwarder }
    }

    pub fn store(&self) -> &dyn AlertStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn AlertStore {
        self.store.as_mut()
    }

    /// Record and (conditionally) forward one alert. Never fails.
    pub fn dispatch(&mut self, mut alert: WellnessAlert, consent: Consent) -> DispatchOutcome {
        alert.acknowledged = false;
        let alert_id = alert.id.clone();
        let trigger = AlertTrigger::from_alert(&alert);

        info!(
            alert_id = %alert_id,
            alert_type = alert.alert_type.as_str(),
            severity = alert.severity.as_str(),
            change = alert.percentage_change,
            "wellness alert emitted"
        );

        let stored_locally = match self.store.append_local(alert) {
            Ok(()) => true,
            Err(e) => {
                warn!(alert_id = %alert_id, error = %e, "failed to store alert locally");
                false
            }
        };

        let should_forward = match trigger.severity {
            AlertSeverity::High => true,
            AlertSeverity::Medium => consent.usage_tracking,
        };

        let forward = if !should_forward {
            ForwardStatus::SkippedNoConsent
        } else {
            match self.forwarder.forward(&trigger) {
                Ok(()) => ForwardStatus::Forwarded,
                Err(e) => {
                    warn!(alert_id = %alert_id, error = %e, "failed to forward alert");
                    ForwardStatus::Failed
                }
            }
        };

        DispatchOutcome {
            alert_id,
            stored_locally,
            forward,
        }
    }

    pub fn acknowledge(&mut self, alert_id: &str) -> Result<(), WellnessError> {
        self.store.acknowledge(alert_id)
    }
}

// ============================================================================
// Implementations
// ============================================================================

/// Alert sink held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryAlertStore {
    alerts: Vec<WellnessAlert>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl AlertStore for MemoryAlertStore {
    fn append_local(&mut self, alert: WellnessAlert) -> Result<(), WellnessError> {
        self.alerts.push(alert);
        Ok(())
    }

    fn acknowledge(&mut self, alert_id: &str) -> Result<(), WellnessError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| WellnessError::AlertNotFound(alert_id.to_string()))?;
        alert.acknowledged = true;
        Ok(())
    }

    fn alerts(&self) -> Result<Vec<WellnessAlert>, WellnessError> {
        Ok(self.alerts.clone())
    }
}

/// Forwarder that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopForwarder;

impl AlertForwarder for NoopForwarder {
    fn forward(&self, _trigger: &AlertTrigger) -> Result<(), WellnessError> {
        Ok(())
    }
}

/// Forwarder that keeps every trigger it was handed.
///
/// Clones share the same buffer, so a caller can keep one handle and give
/// the other to a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct RecordingForwarder {
    sent: Arc<Mutex<Vec<AlertTrigger>>>,
}

impl RecordingForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<AlertTrigger> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl AlertForwarder for RecordingForwarder {
    fn forward(&self, trigger: &AlertTrigger) -> Result<(), WellnessError> {
        self.sent
            .lock()
            .map_err(|e| WellnessError::Forwarding(e.to_string()))?
            .push(trigger.clone());
        Ok(())
    }
}

#[cfg(feature = "http")]
pub use http::HttpAlertForwarder;

#[cfg(feature = "http")]
mod http {
    use super::{AlertForwarder, AlertTrigger};
    use crate::error::WellnessError;
    use std::time::Duration;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Posts triggers as JSON to `{base_url}/alerts/trigger`
    #[derive(Debug, Clone)]
    pub struct HttpAlertForwarder {
        base_url: String,
        timeout: Duration,
    }

    impl HttpAlertForwarder {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
                timeout: DEFAULT_TIMEOUT,
            }
        }

        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        pub fn endpoint(&self) -> String {
            format!("{}/alerts/trigger", self.base_url.trim_end_matches('/'))
        }
    }

    impl AlertForwarder for HttpAlertForwarder {
        fn forward(&self, trigger: &AlertTrigger) -> Result<(), WellnessError> {
            let body = serde_json::to_string(trigger)?;
            let agent = ureq::Agent::config_builder()
                .timeout_global(Some(self.timeout))
                .build()
                .new_agent();
            agent
                .post(&self.endpoint())
                .header("Content-Type", "application/json")
                .send(body)
                .map_err(|e| WellnessError::Forwarding(e.to_string()))?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_endpoint_joins_path() {
            assert_eq!(
                HttpAlertForwarder::new("https://api.example.com/").endpoint(),
                "https://api.example.com/alerts/trigger"
            );
            assert_eq!(
                HttpAlertForwarder::new("http://localhost:8080").endpoint(),
                "http://localhost:8080/alerts/trigger"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    struct FailingForwarder;

    impl AlertForwarder for FailingForwarder {
        fn forward(&self, _trigger: &AlertTrigger) -> Result<(), WellnessError> {
            Err(WellnessError::Forwarding("backend unavailable".to_string()))
        }
    }

    fn alert(id: &str, severity: AlertSeverity) -> WellnessAlert {
        WellnessAlert {
            id: id.to_string(),
            alert_type: match severity {
                AlertSeverity::Medium => AlertType::WellnessDecline,
                AlertSeverity::High => AlertType::ProlongedDecline,
            },
            severity,
            baseline_score: 70,
            current_score: 54,
            percentage_change: -23,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap(),
            acknowledged: false,
        }
    }

    fn recording_dispatcher() -> (AlertDispatcher, RecordingForwarder) {
        let forwarder = RecordingForwarder::new();
        let dispatcher =
            AlertDispatcher::new(Box::new(MemoryAlertStore::new()), Box::new(forwarder.clone()));
        (dispatcher, forwarder)
    }

    #[test]
    fn test_high_severity_always_forwarded() {
        let (mut dispatcher, forwarder) = recording_dispatcher();
        let outcome = dispatcher.dispatch(alert("a1", AlertSeverity::High), Consent::default());

        assert_eq!(outcome.forward, ForwardStatus::Forwarded);
        assert!(outcome.stored_locally);
        assert_eq!(forwarder.sent().len(), 1);
        assert_eq!(forwarder.sent()[0].alert_type, AlertType::ProlongedDecline);
    }

    #[test]
    fn test_medium_severity_requires_consent() {
        let (mut dispatcher, forwarder) = recording_dispatcher();

        let outcome = dispatcher.dispatch(alert("a1", AlertSeverity::Medium), Consent::default());
        assert_eq!(outcome.forward, ForwardStatus::SkippedNoConsent);
        assert!(forwarder.sent().is_empty());

        let consent = Consent {
            usage_tracking: true,
        };
        let outcome = dispatcher.dispatch(alert("a2", AlertSeverity::Medium), consent);
        assert_eq!(outcome.forward, ForwardStatus::Forwarded);
        assert_eq!(forwarder.sent().len(), 1);

        // Both are stored locally regardless
        assert_eq!(dispatcher.store().alerts().unwrap().len(), 2);
    }

    #[test]
    fn test_forward_failure_is_swallowed() {
        let mut dispatcher =
            AlertDispatcher::new(Box::new(MemoryAlertStore::new()), Box::new(FailingForwarder));
        let outcome = dispatcher.dispatch(alert("a1", AlertSeverity::High), Consent::default());

        assert_eq!(outcome.forward, ForwardStatus::Failed);
        assert!(outcome.stored_locally);
        assert_eq!(dispatcher.store().alerts().unwrap().len(), 1);
    }

    #[test]
    fn test_stored_unacknowledged() {
        let mut dispatcher = AlertDispatcher::default();
        let mut a = alert("a1", AlertSeverity::Medium);
        a.acknowledged = true;
        dispatcher.dispatch(a, Consent::default());

        let stored = dispatcher.store().alerts().unwrap();
        assert!(!stored[0].acknowledged);
    }

    #[test]
    fn test_acknowledge() {
        let mut dispatcher = AlertDispatcher::default();
        dispatcher.dispatch(alert("a1", AlertSeverity::Medium), Consent::default());

        dispatcher.acknowledge("a1").unwrap();
        assert!(dispatcher.store().alerts().unwrap()[0].acknowledged);

        let missing = dispatcher.acknowledge("nope");
        assert!(matches!(missing, Err(WellnessError::AlertNotFound(_))));
    }

    #[test]
    fn test_trigger_payload_shape() {
        let trigger = AlertTrigger::from_alert(&alert("a1", AlertSeverity::Medium));
        let json: serde_json::Value = serde_json::to_value(&trigger).unwrap();

        assert_eq!(json["type"], "wellness_decline");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["data"]["alert_id"], "a1");
        assert_eq!(json["data"]["baseline_score"], 70);
        assert_eq!(json["data"]["percentage_change"], -23);
    }
}
