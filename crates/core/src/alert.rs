//! Alert types produced by the rule evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Which rule family fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ColdChainBreach,
    Impact,
    LowHumidity,
    HighHumidity,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColdChainBreach => "COLD_CHAIN_BREACH",
            Self::Impact => "IMPACT",
            Self::LowHumidity => "LOW_HUMIDITY",
            Self::HighHumidity => "HIGH_HUMIDITY",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation found in one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReason {
    pub kind: AlertKind,
    pub severity: Severity,
    /// Human-readable description, e.g. `"Temperature 9.5°C above 8°C"`.
    pub message: String,
    /// The measured value that broke the rule.
    pub triggering_value: f64,
}

/// All rule violations for one reading, as persisted and notified.
///
/// Never empty: [`AlertRecord::new`] returns `None` for an empty reason list.
/// `resolved` always starts out `false`; flipping it belongs to the operator
/// tooling downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    shipment_id: String,
    timestamp: Timestamp,
    reasons: Vec<AlertReason>,
    resolved: bool,
}

impl AlertRecord {
    pub fn new(
        shipment_id: impl Into<String>,
        timestamp: Timestamp,
        reasons: Vec<AlertReason>,
    ) -> Option<Self> {
        if reasons.is_empty() {
            return None;
        }
        Some(Self {
            shipment_id: shipment_id.into(),
            timestamp,
            reasons,
            resolved: false,
        })
    }

    pub fn shipment_id(&self) -> &str {
        &self.shipment_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn reasons(&self) -> &[AlertReason] {
        &self.reasons
    }

    pub fn resolved(&self) -> bool {
        self.resolved
    }

    /// The highest severity among the reasons.
    pub fn max_severity(&self) -> Severity {
        self.reasons
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Severity::Low)
    }

    /// One-line summary suitable for a chat webhook.
    pub fn summary(&self) -> String {
        let details = self
            .reasons
            .iter()
            .map(|r| format!("{} {}: {}", r.severity, r.kind, r.message))
            .collect::<Vec<_>>()
            .join("; ");
        format!(
            "[GreenDelivery] {} alert for shipment {} @ {}: {}",
            self.max_severity(),
            self.shipment_id,
            self.timestamp.to_rfc3339(),
            details
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn reason(kind: AlertKind, severity: Severity, message: &str, value: f64) -> AlertReason {
        AlertReason {
            kind,
            severity,
            message: message.to_string(),
            triggering_value: value,
        }
    }

    #[test]
    fn empty_reasons_produce_no_record() {
        assert!(AlertRecord::new("GD-1", Utc::now(), Vec::new()).is_none());
    }

    #[test]
    fn new_record_is_unresolved() {
        let record = AlertRecord::new(
            "GD-1",
            Utc::now(),
            vec![reason(AlertKind::Impact, Severity::High, "Impact 4G above 3G", 4.0)],
        )
        .unwrap();
        assert!(!record.resolved());
    }

    #[test]
    fn max_severity_picks_the_worst_reason() {
        let record = AlertRecord::new(
            "GD-2",
            Utc::now(),
            vec![
                reason(AlertKind::LowHumidity, Severity::Medium, "low", 40.0),
                reason(AlertKind::Impact, Severity::High, "impact", 4.0),
            ],
        )
        .unwrap();
        assert_eq!(record.max_severity(), Severity::High);
    }

    #[test]
    fn summary_names_shipment_and_every_reason() {
        let record = AlertRecord::new(
            "GD-2",
            Utc::now(),
            vec![
                reason(AlertKind::Impact, Severity::High, "Impact 4G above 3G", 4.0),
                reason(AlertKind::LowHumidity, Severity::Medium, "Humidity 40% below 50%", 40.0),
            ],
        )
        .unwrap();
        let summary = record.summary();
        assert!(summary.contains("GD-2"));
        assert!(summary.contains("HIGH IMPACT: Impact 4G above 3G"));
        assert!(summary.contains("MEDIUM LOW_HUMIDITY: Humidity 40% below 50%"));
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn kind_serializes_screaming_snake_case() {
        let json = serde_json::to_value(AlertKind::ColdChainBreach).unwrap();
        assert_eq!(json, "COLD_CHAIN_BREACH");
    }
}
