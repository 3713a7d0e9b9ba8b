//! Telemetry readings and their physical-plausibility validation.
//!
//! [`RawReading`] is the wire form posted by trackers (or decoded from a
//! queue message). [`validate`] turns it into a [`Reading`], whose fields
//! can no longer change. Validation is pure: it never touches storage and
//! never calls the rule evaluator.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Maximum length of a shipment identifier, in characters.
pub const MAX_SHIPMENT_ID_LEN: usize = 64;

/// Physically plausible temperature range, in degrees Celsius.
pub const TEMPERATURE_RANGE_C: (f64, f64) = (-50.0, 100.0);
/// Relative humidity range, in percent.
pub const HUMIDITY_RANGE_PCT: (f64, f64) = (0.0, 100.0);
/// Accelerometer shock magnitude range, in G.
pub const G_FORCE_RANGE: (f64, f64) = (0.0, 20.0);
/// Latitude range, in degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
/// Longitude range, in degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// An unvalidated telemetry record as received from a tracker.
///
/// Older tracker firmware uses different field names (`parcel_id`,
/// `ID_envio`, `temperatura`, `acelerometro_ejeZ`, ...); they are accepted as
/// aliases so every generation of device lands on the same model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default, alias = "parcel_id", alias = "ID_envio")]
    pub shipment_id: Option<String>,

    /// RFC 3339 instant. Legacy queue messages omit it.
    #[serde(default, alias = "ts")]
    pub timestamp: Option<String>,

    #[serde(default, alias = "temperatura")]
    pub temperature_c: Option<f64>,

    #[serde(default, alias = "humedad")]
    pub humidity_pct: Option<f64>,

    #[serde(default, alias = "acelerometro_ejeZ", alias = "acelerometro-ejeZ")]
    pub g_force: Option<f64>,

    #[serde(default, alias = "latitud")]
    pub lat: Option<f64>,

    #[serde(default, alias = "longitud")]
    pub lon: Option<f64>,
}

impl RawReading {
    /// Start a raw reading for `shipment_id` with no measurements.
    pub fn new(shipment_id: impl Into<String>) -> Self {
        Self {
            shipment_id: Some(shipment_id.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp.to_rfc3339());
        self
    }

    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature_c = Some(celsius);
        self
    }

    pub fn humidity(mut self, percent: f64) -> Self {
        self.humidity_pct = Some(percent);
        self
    }

    pub fn g_force(mut self, g: f64) -> Self {
        self.g_force = Some(g);
        self
    }

    pub fn position(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }
}

// ---------------------------------------------------------------------------
// Validated form
// ---------------------------------------------------------------------------

/// A validated telemetry reading.
///
/// Only obtainable through [`validate`] / [`validate_at`], so every present
/// measurement is guaranteed to be inside its physical range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    shipment_id: String,
    timestamp: Timestamp,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
    g_force: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl Reading {
    pub fn shipment_id(&self) -> &str {
        &self.shipment_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn temperature_c(&self) -> Option<f64> {
        self.temperature_c
    }

    pub fn humidity_pct(&self) -> Option<f64> {
        self.humidity_pct
    }

    pub fn g_force(&self) -> Option<f64> {
        self.g_force
    }

    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    pub fn lon(&self) -> Option<f64> {
        self.lon
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a raw reading was rejected. Always caused by the client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("shipment_id is required")]
    MissingShipmentId,

    #[error("shipment_id must be at most {max} characters, got {len}")]
    ShipmentIdTooLong { len: usize, max: usize },

    #[error("timestamp {value:?} is not a valid RFC 3339 instant")]
    MalformedTimestamp { value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingShipmentId | Self::ShipmentIdTooLong { .. } => "shipment_id",
            Self::MalformedTimestamp { .. } => "timestamp",
            Self::OutOfRange { field, .. } => field,
        }
    }

    /// Machine-readable description of the violated bound.
    pub fn bound(&self) -> String {
        match self {
            Self::MissingShipmentId => "non-empty".to_string(),
            Self::ShipmentIdTooLong { max, .. } => format!("max_length={max}"),
            Self::MalformedTimestamp { .. } => "rfc3339".to_string(),
            Self::OutOfRange { min, max, .. } => format!("[{min}, {max}]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a raw reading, stamping it with the current time if it carries
/// no timestamp of its own.
pub fn validate(raw: &RawReading) -> Result<Reading, ValidationError> {
    validate_at(raw, Utc::now())
}

/// Validate a raw reading; `received_at` is used when `raw.timestamp` is
/// absent.
///
/// Fields are checked in declaration order and the first violation wins.
pub fn validate_at(raw: &RawReading, received_at: Timestamp) -> Result<Reading, ValidationError> {
    let shipment_id = validate_shipment_id(raw.shipment_id.as_deref())?;

    let timestamp = match raw.timestamp.as_deref() {
        Some(value) => parse_timestamp(value)?,
        None => received_at,
    };

    Ok(Reading {
        shipment_id,
        timestamp,
        temperature_c: check_range(raw.temperature_c, "temperature_c", TEMPERATURE_RANGE_C)?,
        humidity_pct: check_range(raw.humidity_pct, "humidity_pct", HUMIDITY_RANGE_PCT)?,
        g_force: check_range(raw.g_force, "g_force", G_FORCE_RANGE)?,
        lat: check_range(raw.lat, "lat", LATITUDE_RANGE)?,
        lon: check_range(raw.lon, "lon", LONGITUDE_RANGE)?,
    })
}

fn validate_shipment_id(value: Option<&str>) -> Result<String, ValidationError> {
    let id = value.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(ValidationError::MissingShipmentId);
    }
    let len = id.chars().count();
    if len > MAX_SHIPMENT_ID_LEN {
        return Err(ValidationError::ShipmentIdTooLong {
            len,
            max: MAX_SHIPMENT_ID_LEN,
        });
    }
    Ok(id.to_string())
}

/// Parse an RFC 3339 instant (any offset) into UTC. Timestamps without an
/// offset are taken to be UTC already.
fn parse_timestamp(value: &str) -> Result<Timestamp, ValidationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ValidationError::MalformedTimestamp {
            value: value.to_string(),
        })
}

fn check_range(
    value: Option<f64>,
    field: &'static str,
    (min, max): (f64, f64),
) -> Result<Option<f64>, ValidationError> {
    match value {
        // NaN fails `contains`, so non-finite values are rejected here too.
        Some(v) if !(min..=max).contains(&v) => Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value: v,
        }),
        other => Ok(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn received() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn accepts_fully_populated_reading() {
        let raw = RawReading::new("GD-1")
            .temperature(4.2)
            .humidity(70.0)
            .g_force(1.1)
            .position(40.4168, -3.7038);

        let reading = validate_at(&raw, received()).unwrap();
        assert_eq!(reading.shipment_id(), "GD-1");
        assert_eq!(reading.temperature_c(), Some(4.2));
        assert_eq!(reading.humidity_pct(), Some(70.0));
        assert_eq!(reading.g_force(), Some(1.1));
        assert_eq!(reading.lat(), Some(40.4168));
        assert_eq!(reading.lon(), Some(-3.7038));
        assert_eq!(reading.timestamp(), received());
    }

    #[test]
    fn missing_optional_fields_are_not_errors() {
        let reading = validate_at(&RawReading::new("GD-2"), received()).unwrap();
        assert_eq!(reading.temperature_c(), None);
        assert_eq!(reading.g_force(), None);
        assert_eq!(reading.lat(), None);
    }

    #[test]
    fn rejects_missing_or_blank_shipment_id() {
        assert_eq!(
            validate_at(&RawReading::default(), received()),
            Err(ValidationError::MissingShipmentId)
        );
        assert_eq!(
            validate_at(&RawReading::new("   "), received()),
            Err(ValidationError::MissingShipmentId)
        );
    }

    #[test]
    fn rejects_overlong_shipment_id() {
        let err = validate_at(&RawReading::new("x".repeat(65)), received()).unwrap_err();
        assert_matches!(err, ValidationError::ShipmentIdTooLong { len: 65, max: 64 });
        assert_eq!(err.field(), "shipment_id");
        assert_eq!(err.bound(), "max_length=64");

        assert!(validate_at(&RawReading::new("x".repeat(64)), received()).is_ok());
    }

    #[test]
    fn rejects_temperature_of_150_with_field_and_bound() {
        let err = validate_at(&RawReading::new("GD-1").temperature(150.0), received()).unwrap_err();
        assert_eq!(err.field(), "temperature_c");
        assert_eq!(err.bound(), "[-50, 100]");
        assert_eq!(err.to_string(), "temperature_c must be between -50 and 100, got 150");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let raw = RawReading::new("GD-1")
            .temperature(-50.0)
            .humidity(100.0)
            .g_force(20.0)
            .position(-90.0, 180.0);
        assert!(validate_at(&raw, received()).is_ok());
    }

    #[test]
    fn rejects_each_out_of_range_field() {
        let cases = [
            (RawReading::new("a").humidity(-0.1), "humidity_pct"),
            (RawReading::new("a").g_force(20.5), "g_force"),
            (RawReading::new("a").position(91.0, 0.0), "lat"),
            (RawReading::new("a").position(0.0, -180.5), "lon"),
        ];
        for (raw, field) in cases {
            let err = validate_at(&raw, received()).unwrap_err();
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = validate_at(&RawReading::new("a").temperature(f64::NAN), received()).unwrap_err();
        assert_eq!(err.field(), "temperature_c");
    }

    #[test]
    fn normalises_timestamp_offset_to_utc() {
        let raw = RawReading {
            timestamp: Some("2026-03-01T14:00:00+02:00".to_string()),
            ..RawReading::new("GD-1")
        };
        let reading = validate_at(&raw, Utc::now()).unwrap();
        assert_eq!(reading.timestamp(), received());
    }

    #[test]
    fn naive_timestamp_is_taken_as_utc() {
        let raw = RawReading {
            timestamp: Some("2026-03-01T12:00:00.000".to_string()),
            ..RawReading::new("GD-1")
        };
        assert_eq!(validate_at(&raw, Utc::now()).unwrap().timestamp(), received());
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let raw = RawReading {
            timestamp: Some("yesterday".to_string()),
            ..RawReading::new("GD-1")
        };
        let err = validate_at(&raw, received()).unwrap_err();
        assert_matches!(err, ValidationError::MalformedTimestamp { .. });
        assert_eq!(err.field(), "timestamp");
    }

    #[test]
    fn legacy_field_names_deserialize() {
        let json = serde_json::json!({
            "ID_envio": "GD-MEDS-1001",
            "timestamp": "2026-03-01T12:00:00+00:00",
            "temperatura": 9.1,
            "humedad": 80.5,
            "acelerometro_ejeZ": 1.2,
            "latitud": 40.41,
            "longitud": -3.70,
            "bateria": 97.0
        });
        let raw: RawReading = serde_json::from_value(json).unwrap();
        let reading = validate_at(&raw, received()).unwrap();
        assert_eq!(reading.shipment_id(), "GD-MEDS-1001");
        assert_eq!(reading.temperature_c(), Some(9.1));
        assert_eq!(reading.humidity_pct(), Some(80.5));
        assert_eq!(reading.g_force(), Some(1.2));
        assert_eq!(reading.lat(), Some(40.41));
    }

    #[test]
    fn edge_tracker_field_names_deserialize() {
        let json = serde_json::json!({
            "parcel_id": "sample-parcel-001",
            "ts": "2026-03-01T12:00:00Z",
            "temperature_c": 3.3,
            "g_force": 0.4
        });
        let raw: RawReading = serde_json::from_value(json).unwrap();
        let reading = validate_at(&raw, Utc::now()).unwrap();
        assert_eq!(reading.shipment_id(), "sample-parcel-001");
        assert_eq!(reading.timestamp(), received());
    }
}
