//! Energy reading DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::records::NewReading;
use crate::domain::{EnergyData, Measurement};
use crate::shared::Page;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnergyDataDto {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub consumption_kwh: f64,
    pub production_kwh: f64,
    pub net_energy_kwh: f64,
    pub power_watts: Option<f64>,
    pub voltage: Option<f64>,
    pub current_amps: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub cost: f64,
    pub created_at: DateTime<Utc>,
}

impl From<EnergyData> for EnergyDataDto {
    fn from(d: EnergyData) -> Self {
        Self {
            net_energy_kwh: d.consumption_kwh - d.production_kwh,
            id: d.id,
            device_id: d.device_id,
            user_id: d.user_id,
            timestamp: d.timestamp,
            consumption_kwh: d.consumption_kwh,
            production_kwh: d.production_kwh,
            power_watts: d.power_watts,
            voltage: d.voltage,
            current_amps: d.current_amps,
            temperature_celsius: d.temperature_celsius,
            humidity_percent: d.humidity_percent,
            cost: d.cost,
            created_at: d.created_at,
        }
    }
}

/// Measured values of a reading. Cost is always derived server-side.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MeasurementRequest {
    #[validate(range(min = 0.0, max = 1e9))]
    pub consumption_kwh: f64,
    #[validate(range(min = 0.0, max = 1e9))]
    pub production_kwh: Option<f64>,
    #[validate(range(min = 0.0, max = 1e9))]
    pub power_watts: Option<f64>,
    #[validate(range(min = 0.0, max = 1e9))]
    pub voltage: Option<f64>,
    #[validate(range(min = 0.0, max = 1e9))]
    pub current_amps: Option<f64>,
    #[validate(range(min = -50.0, max = 100.0))]
    pub temperature_celsius: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity_percent: Option<f64>,
}

impl From<MeasurementRequest> for Measurement {
    fn from(r: MeasurementRequest) -> Self {
        Self {
            consumption_kwh: r.consumption_kwh,
            production_kwh: r.production_kwh.unwrap_or(0.0),
            power_watts: r.power_watts,
            voltage: r.voltage,
            current_amps: r.current_amps,
            temperature_celsius: r.temperature_celsius,
            humidity_percent: r.humidity_percent,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEnergyDataRequest {
    /// Reading time; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[validate(nested)]
    pub measurement: MeasurementRequest,
}

impl From<CreateEnergyDataRequest> for NewReading {
    fn from(r: CreateEnergyDataRequest) -> Self {
        Self {
            timestamp: r.timestamp,
            measurement: r.measurement.into(),
        }
    }
}

/// Time-range filter for reading listings and statistics.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingsQuery {
    /// Inclusive lower bound (RFC 3339)
    #[serde(alias = "start_date")]
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339)
    #[serde(alias = "end_date")]
    pub end: Option<DateTime<Utc>>,
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

impl ReadingsQuery {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_request_flattens_measurement() {
        let req: CreateEnergyDataRequest = serde_json::from_value(serde_json::json!({
            "consumption_kwh": 2.5,
            "power_watts": 1200.0
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let reading = NewReading::from(req);
        assert!(reading.timestamp.is_none());
        assert_eq!(reading.measurement.consumption_kwh, 2.5);
        assert_eq!(reading.measurement.production_kwh, 0.0);
        assert_eq!(reading.measurement.power_watts, Some(1200.0));
    }

    #[test]
    fn humidity_over_100_is_rejected() {
        let req: CreateEnergyDataRequest = serde_json::from_value(serde_json::json!({
            "consumption_kwh": 1.0,
            "humidity_percent": 120.0
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn oversized_consumption_is_rejected() {
        let req: CreateEnergyDataRequest = serde_json::from_value(serde_json::json!({
            "consumption_kwh": 5e28
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn readings_query_accepts_date_aliases() {
        let q: ReadingsQuery = serde_json::from_value(serde_json::json!({
            "start_date": "2024-03-01T00:00:00Z",
            "end": "2024-03-02T00:00:00Z"
        }))
        .unwrap();
        assert!(q.start.is_some());
        assert!(q.end.is_some());
        assert_eq!(q.page(), Page::default());
    }
}
