//! In-process sink implementation for local runs without a database.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::alert::AlertRecord;
use crate::reading::Reading;
use crate::sink::{PersistenceSink, StoreError};

/// Keeps every stored reading and alert in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    readings: Mutex<Vec<Reading>>,
    alerts: Mutex<Vec<AlertRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored readings.
    pub fn readings(&self) -> Vec<Reading> {
        self.readings
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Snapshot of all stored alerts.
    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.alerts
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn store_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        self.readings
            .lock()
            .map_err(|_| StoreError::Backend("reading store lock poisoned".to_string()))?
            .push(reading.clone());
        Ok(())
    }

    async fn store_alert(&self, alert: &AlertRecord) -> Result<(), StoreError> {
        self.alerts
            .lock()
            .map_err(|_| StoreError::Backend("alert store lock poisoned".to_string()))?
            .push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::reading::{validate, RawReading};
    use crate::rules::evaluate;

    #[tokio::test]
    async fn stores_readings_and_alerts_in_order() {
        let sink = MemorySink::new();
        let first = validate(&RawReading::new("GD-1").temperature(4.0)).unwrap();
        let second = validate(&RawReading::new("GD-2").temperature(11.0)).unwrap();

        sink.store_reading(&first).await.unwrap();
        sink.store_reading(&second).await.unwrap();

        let alert = AlertRecord::new("GD-2", Utc::now(), evaluate(&second)).unwrap();
        sink.store_alert(&alert).await.unwrap();

        let readings = sink.readings();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].shipment_id(), "GD-1");
        assert_eq!(readings[1].shipment_id(), "GD-2");
        assert_eq!(sink.alerts(), vec![alert]);
    }
}
