//! Synthetic cold-chain tracker.
//!
//! Each shipment starts near the Madrid distribution centre with a
//! refrigerated baseline (3-6 °C, 70-85 % humidity) and drifts a little on
//! every reading. Refrigeration failures and impacts are injected at the
//! configured [`FaultRates`].

use greendelivery_core::reading::RawReading;
use greendelivery_core::types::Timestamp;
use rand::Rng;

pub const DEFAULT_BREACH_PROBABILITY: f64 = 0.03;
pub const DEFAULT_IMPACT_PROBABILITY: f64 = 0.05;

const ORIGIN: (f64, f64) = (40.4168, -3.7038);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SimulatorError {
    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
}

/// Per-reading probabilities of injected failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultRates {
    /// Refrigeration failure: temperature jumps 3-7 °C above normal drift.
    pub breach: f64,
    /// Handling impact: 2.5-5 G instead of the usual 0.8-1.2 G.
    pub impact: f64,
}

impl FaultRates {
    pub fn new(breach: f64, impact: f64) -> Result<Self, SimulatorError> {
        for (name, value) in [("breach", breach), ("impact", impact)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulatorError::InvalidProbability { name, value });
            }
        }
        Ok(Self { breach, impact })
    }

    /// Never inject a failure.
    pub fn none() -> Self {
        Self {
            breach: 0.0,
            impact: 0.0,
        }
    }
}

impl Default for FaultRates {
    fn default() -> Self {
        Self {
            breach: DEFAULT_BREACH_PROBABILITY,
            impact: DEFAULT_IMPACT_PROBABILITY,
        }
    }
}

/// A random `GD-nnnn` shipment id.
pub fn random_shipment_id(rng: &mut impl Rng) -> String {
    format!("GD-{}", rng.random_range(1000..=9999))
}

/// Generates the reading stream of one tracker.
pub struct SensorSimulator<R> {
    shipment_id: String,
    lat: f64,
    lon: f64,
    base_temperature: f64,
    base_humidity: f64,
    /// Maximum position change per reading, in degrees.
    step_deg: f64,
    faults: FaultRates,
    rng: R,
}

impl<R: Rng> SensorSimulator<R> {
    pub fn new(shipment_id: impl Into<String>, faults: FaultRates, mut rng: R) -> Self {
        Self {
            shipment_id: shipment_id.into(),
            lat: ORIGIN.0 + rng.random_range(-0.02..0.02),
            lon: ORIGIN.1 + rng.random_range(-0.02..0.02),
            base_temperature: rng.random_range(3.0..6.0),
            base_humidity: rng.random_range(70.0..85.0),
            step_deg: rng.random_range(0.0003..0.0008),
            faults,
            rng,
        }
    }

    pub fn shipment_id(&self) -> &str {
        &self.shipment_id
    }

    /// Produce the next reading, stamped `now`.
    pub fn next_reading(&mut self, now: Timestamp) -> RawReading {
        let mut temperature = self.base_temperature + self.rng.random_range(-2.0..2.0);
        if self.rng.random_bool(self.faults.breach) {
            temperature += self.rng.random_range(3.0..7.0);
        }

        let humidity =
            (self.base_humidity + self.rng.random_range(-10.0..10.0)).clamp(0.0, 100.0);

        let step = self.step_deg;
        self.lat += self.rng.random_range(-step..step);
        self.lon += self.rng.random_range(-step..step);

        let g_force = if self.rng.random_bool(self.faults.impact) {
            self.rng.random_range(2.5..5.0)
        } else {
            self.rng.random_range(0.8..1.2)
        };

        RawReading::new(self.shipment_id.clone())
            .at(now)
            .temperature(round_to(temperature, 2))
            .humidity(round_to(humidity, 1))
            .g_force(round_to(g_force, 2))
            .position(round_to(self.lat, 6), round_to(self.lon, 6))
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
