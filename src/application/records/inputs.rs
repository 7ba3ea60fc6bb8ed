//! Inputs accepted by the record service, decoupled from the HTTP DTOs.

use chrono::{DateTime, Utc};

use crate::domain::{DeviceType, EnergyUnit, Measurement};

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub energy_goal_kwh: Option<f64>,
    pub savings_target_percent: Option<f64>,
    pub preferred_temperature_celsius: Option<f64>,
    pub preferred_unit: Option<EnergyUnit>,
}

/// Partial update: `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub energy_goal_kwh: Option<f64>,
    pub savings_target_percent: Option<f64>,
    pub preferred_temperature_celsius: Option<f64>,
    pub preferred_unit: Option<EnergyUnit>,
}

#[derive(Debug, Clone)]
pub struct NewDevice {
    pub name: String,
    pub device_type: DeviceType,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceChanges {
    pub name: Option<String>,
    pub device_type: Option<DeviceType>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewReading {
    /// Defaults to the time of recording.
    pub timestamp: Option<DateTime<Utc>>,
    pub measurement: Measurement,
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub devices: u64,
    pub energy_records: u64,
}
