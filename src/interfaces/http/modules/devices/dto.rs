//! Device DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::application::records::{DeviceChanges, NewDevice};
use crate::domain::{Device, DeviceType};
use crate::interfaces::http::modules::energy::EnergyDataDto;

pub(crate) fn validate_device_type(kind: &str) -> Result<(), ValidationError> {
    kind.parse::<DeviceType>().map(|_| ()).map_err(|_| {
        ValidationError::new("device_type").with_message(
            "must be one of hvac, lighting, appliance, electronics, water_heater, solar_panel, smart_meter, other"
                .into(),
        )
    })
}

fn parse_device_type(kind: &str) -> DeviceType {
    kind.parse().unwrap_or(DeviceType::Other)
}

/// Device API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceDto {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// hvac, lighting, appliance, electronics, water_heater, solar_panel, smart_meter, other
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceDto {
    fn from(d: Device) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            name: d.name,
            device_type: d.device_type.to_string(),
            model: d.model,
            manufacturer: d.manufacturer,
            location: d.location,
            rated_power_watts: d.rated_power_watts,
            is_smart_device: d.is_smart_device,
            is_active: d.is_active,
            created_at: d.created_at,
            updated_at: d.updated_at,
            last_seen: d.last_seen,
        }
    }
}

/// Device with its readings from the last `hours` hours
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceWithReadingsDto {
    #[serde(flatten)]
    pub device: DeviceDto,
    pub hours: u32,
    pub recent_readings: Vec<EnergyDataDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDeviceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(custom(function = "validate_device_type"))]
    pub device_type: String,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub manufacturer: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(range(min = 0.0))]
    pub rated_power_watts: Option<f64>,
    #[serde(default)]
    pub is_smart_device: bool,
}

impl From<CreateDeviceRequest> for NewDevice {
    fn from(r: CreateDeviceRequest) -> Self {
        Self {
            name: r.name,
            device_type: parse_device_type(&r.device_type),
            model: r.model,
            manufacturer: r.manufacturer,
            location: r.location,
            rated_power_watts: r.rated_power_watts,
            is_smart_device: r.is_smart_device,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDeviceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_device_type"))]
    pub device_type: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub manufacturer: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(range(min = 0.0))]
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<UpdateDeviceRequest> for DeviceChanges {
    fn from(r: UpdateDeviceRequest) -> Self {
        Self {
            name: r.name,
            device_type: r.device_type.as_deref().map(parse_device_type),
            model: r.model,
            manufacturer: r.manufacturer,
            location: r.location,
            rated_power_watts: r.rated_power_watts,
            is_smart_device: r.is_smart_device,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDevicesParams {
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    /// Include deactivated devices (default false)
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceDetailParams {
    /// Hours of readings to include, 1-168 (default 24)
    #[validate(range(min = 1, max = 168))]
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceDeletedDto {
    pub device_id: String,
    pub energy_records_deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_is_validated_and_parsed() {
        let req: CreateDeviceRequest = serde_json::from_value(serde_json::json!({
            "name": "Boiler",
            "device_type": "Water_Heater",
            "rated_power_watts": 3000.0
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let input = NewDevice::from(req);
        assert_eq!(input.device_type, DeviceType::WaterHeater);
        assert!(!input.is_smart_device);

        let bad: CreateDeviceRequest = serde_json::from_value(serde_json::json!({
            "name": "Thing",
            "device_type": "toaster-oven",
            "rated_power_watts": -5.0
        }))
        .unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("device_type"));
        assert!(errors.field_errors().contains_key("rated_power_watts"));
    }
}
