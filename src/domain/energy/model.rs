//! Energy reading domain model

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Pricing;
use crate::domain::{Device, DomainError, DomainResult};

/// Upper bound for any measured quantity (kWh, W, V, A).
pub const MAX_MEASUREMENT: f64 = 1e9;

/// The measured part of a reading, as supplied by a device or a correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    pub consumption_kwh: f64,
    pub production_kwh: f64,
    pub power_watts: Option<f64>,
    pub voltage: Option<f64>,
    pub current_amps: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
}

impl Measurement {
    pub fn consumption(kwh: f64) -> Self {
        Self {
            consumption_kwh: kwh,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let non_negative = [
            ("consumption_kwh", Some(self.consumption_kwh)),
            ("production_kwh", Some(self.production_kwh)),
            ("power_watts", self.power_watts),
            ("voltage", self.voltage),
            ("current_amps", self.current_amps),
        ];
        for (field, value) in non_negative {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(DomainError::Validation(format!(
                        "{} must be a non-negative number",
                        field
                    )));
                }
                if v > MAX_MEASUREMENT {
                    return Err(DomainError::Validation(format!(
                        "{} must not exceed {}",
                        field, MAX_MEASUREMENT
                    )));
                }
            }
        }
        if let Some(t) = self.temperature_celsius {
            if !t.is_finite() || t.abs() > MAX_MEASUREMENT {
                return Err(DomainError::Validation(
                    "temperature_celsius out of range".into(),
                ));
            }
        }
        if let Some(h) = self.humidity_percent {
            if !(0.0..=100.0).contains(&h) {
                return Err(DomainError::Validation(
                    "humidity_percent must be between 0 and 100".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyData {
    pub id: String,
    pub device_id: String,
    /// Owner of the device at the time of recording.
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub consumption_kwh: f64,
    pub production_kwh: f64,
    pub power_watts: Option<f64>,
    pub voltage: Option<f64>,
    pub current_amps: Option<f64>,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    /// Always `consumption_kwh` priced with the configured rate.
    pub cost: f64,
    pub created_at: DateTime<Utc>,
}

impl EnergyData {
    pub fn record(
        device: &Device,
        timestamp: DateTime<Utc>,
        measurement: Measurement,
        pricing: &Pricing,
    ) -> Self {
        let mut data = Self {
            id: Uuid::new_v4().to_string(),
            device_id: device.id.clone(),
            user_id: device.user_id.clone(),
            timestamp,
            consumption_kwh: 0.0,
            production_kwh: 0.0,
            power_watts: None,
            voltage: None,
            current_amps: None,
            temperature_celsius: None,
            humidity_percent: None,
            cost: 0.0,
            created_at: Utc::now(),
        };
        data.apply(measurement, pricing);
        data
    }

    /// Replace the measured fields and re-derive the cost.
    pub fn apply(&mut self, m: Measurement, pricing: &Pricing) {
        self.consumption_kwh = m.consumption_kwh;
        self.production_kwh = m.production_kwh;
        self.power_watts = m.power_watts;
        self.voltage = m.voltage;
        self.current_amps = m.current_amps;
        self.temperature_celsius = m.temperature_celsius;
        self.humidity_percent = m.humidity_percent;
        self.cost = pricing.cost_of(m.consumption_kwh);
    }

    pub fn measurement(&self) -> Measurement {
        Measurement {
            consumption_kwh: self.consumption_kwh,
            production_kwh: self.production_kwh,
            power_watts: self.power_watts,
            voltage: self.voltage,
            current_amps: self.current_amps,
            temperature_celsius: self.temperature_celsius,
            humidity_percent: self.humidity_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceType;

    #[test]
    fn recording_derives_cost() {
        let device = Device::new("u1", "Heat pump", DeviceType::Hvac);
        let data = EnergyData::record(
            &device,
            Utc::now(),
            Measurement::consumption(12.5),
            &Pricing::new(0.2, "USD"),
        );
        assert_eq!(data.cost, 2.5);
        assert_eq!(data.user_id, "u1");
        assert_eq!(data.device_id, device.id);
    }

    #[test]
    fn correction_recomputes_cost() {
        let device = Device::new("u1", "Lamp", DeviceType::Lighting);
        let pricing = Pricing::new(0.2, "USD");
        let mut data = EnergyData::record(&device, Utc::now(), Measurement::consumption(1.0), &pricing);

        let mut m = data.measurement();
        m.consumption_kwh = 4.0;
        data.apply(m, &pricing);
        assert_eq!(data.cost, 0.8);
    }

    #[test]
    fn negative_consumption_is_rejected() {
        let err = Measurement::consumption(-1.0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn oversized_values_are_rejected() {
        assert!(Measurement::consumption(MAX_MEASUREMENT).validate().is_ok());
        assert!(Measurement::consumption(5e28).validate().is_err());
        assert!(Measurement::consumption(1e30).validate().is_err());
        let m = Measurement {
            power_watts: Some(1e12),
            ..Measurement::consumption(1.0)
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn humidity_out_of_range_is_rejected() {
        let m = Measurement {
            humidity_percent: Some(140.0),
            ..Measurement::consumption(1.0)
        };
        assert!(m.validate().is_err());
    }
}
