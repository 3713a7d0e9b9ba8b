//! Threshold rule evaluation for validated readings.
//!
//! Pure logic, no I/O. A single [`RulePolicy`] holds every threshold and the
//! severity it raises, so the ingest API, the queue processor and the
//! simulator all judge readings the same way.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertKind, AlertReason, Severity};
use crate::error::CoreError;
use crate::reading::Reading;

/// A threshold and the severity raised when it is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThreshold {
    pub threshold: f64,
    pub severity: Severity,
}

impl RuleThreshold {
    pub const fn new(threshold: f64, severity: Severity) -> Self {
        Self {
            threshold,
            severity,
        }
    }
}

/// The canonical alerting policy.
///
/// All comparisons are strict: a value exactly on a threshold raises nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePolicy {
    /// Cold-chain breach when `temperature_c` is above this.
    pub temperature_max: RuleThreshold,
    /// "Too cold" when `temperature_c` is below this.
    pub temperature_min: RuleThreshold,
    /// Impact when `g_force` is above this.
    pub g_force_max: RuleThreshold,
    /// Low humidity when `humidity_pct` is below this.
    pub humidity_min: RuleThreshold,
    /// High humidity when `humidity_pct` is above this.
    pub humidity_max: RuleThreshold,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            temperature_max: RuleThreshold::new(8.0, Severity::Critical),
            temperature_min: RuleThreshold::new(2.0, Severity::Medium),
            g_force_max: RuleThreshold::new(3.0, Severity::High),
            humidity_min: RuleThreshold::new(50.0, Severity::Medium),
            humidity_max: RuleThreshold::new(90.0, Severity::Medium),
        }
    }
}

impl RulePolicy {
    /// Check the policy is internally consistent.
    ///
    /// Thresholds must be finite and each min must be strictly below its max.
    pub fn validate(&self) -> Result<(), CoreError> {
        let all = [
            ("temperature_max", self.temperature_max.threshold),
            ("temperature_min", self.temperature_min.threshold),
            ("g_force_max", self.g_force_max.threshold),
            ("humidity_min", self.humidity_min.threshold),
            ("humidity_max", self.humidity_max.threshold),
        ];
        for (name, value) in all {
            if !value.is_finite() {
                return Err(CoreError::Configuration(format!(
                    "{name} threshold must be finite, got {value}"
                )));
            }
        }
        if self.temperature_min.threshold >= self.temperature_max.threshold {
            return Err(CoreError::Configuration(format!(
                "temperature_min ({}) must be below temperature_max ({})",
                self.temperature_min.threshold, self.temperature_max.threshold
            )));
        }
        if self.humidity_min.threshold >= self.humidity_max.threshold {
            return Err(CoreError::Configuration(format!(
                "humidity_min ({}) must be below humidity_max ({})",
                self.humidity_min.threshold, self.humidity_max.threshold
            )));
        }
        if self.g_force_max.threshold < 0.0 {
            return Err(CoreError::Configuration(format!(
                "g_force_max must be non-negative, got {}",
                self.g_force_max.threshold
            )));
        }
        Ok(())
    }

    /// Evaluate every rule against `reading`.
    ///
    /// Reasons come out in a fixed order: temperature, impact, humidity.
    /// Absent measurements skip their rules.
    pub fn evaluate(&self, reading: &Reading) -> Vec<AlertReason> {
        let mut reasons = Vec::new();

        if let Some(temp) = reading.temperature_c() {
            let max = self.temperature_max;
            let min = self.temperature_min;
            if temp > max.threshold {
                reasons.push(AlertReason {
                    kind: AlertKind::ColdChainBreach,
                    severity: max.severity,
                    message: format!(
                        "Temperature {temp}°C above {}°C: cold chain breach",
                        max.threshold
                    ),
                    triggering_value: temp,
                });
            } else if temp < min.threshold {
                reasons.push(AlertReason {
                    kind: AlertKind::ColdChainBreach,
                    severity: min.severity,
                    message: format!("Temperature {temp}°C below {}°C: too cold", min.threshold),
                    triggering_value: temp,
                });
            }
        }

        if let Some(g) = reading.g_force() {
            let max = self.g_force_max;
            if g > max.threshold {
                reasons.push(AlertReason {
                    kind: AlertKind::Impact,
                    severity: max.severity,
                    message: format!("Impact {g}G above {}G", max.threshold),
                    triggering_value: g,
                });
            }
        }

        if let Some(humidity) = reading.humidity_pct() {
            let min = self.humidity_min;
            let max = self.humidity_max;
            if humidity < min.threshold {
                reasons.push(AlertReason {
                    kind: AlertKind::LowHumidity,
                    severity: min.severity,
                    message: format!("Humidity {humidity}% below {}%", min.threshold),
                    triggering_value: humidity,
                });
            } else if humidity > max.threshold {
                reasons.push(AlertReason {
                    kind: AlertKind::HighHumidity,
                    severity: max.severity,
                    message: format!("Humidity {humidity}% above {}%", max.threshold),
                    triggering_value: humidity,
                });
            }
        }

        reasons
    }
}

/// Evaluate `reading` against the default policy.
pub fn evaluate(reading: &Reading) -> Vec<AlertReason> {
    RulePolicy::default().evaluate(reading)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
