//! Device domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Hvac,
    Lighting,
    Appliance,
    Electronics,
    WaterHeater,
    SolarPanel,
    SmartMeter,
    Other,
}

impl DeviceType {
    pub const ALL: [DeviceType; 8] = [
        DeviceType::Hvac,
        DeviceType::Lighting,
        DeviceType::Appliance,
        DeviceType::Electronics,
        DeviceType::WaterHeater,
        DeviceType::SolarPanel,
        DeviceType::SmartMeter,
        DeviceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Hvac => "hvac",
            DeviceType::Lighting => "lighting",
            DeviceType::Appliance => "appliance",
            DeviceType::Electronics => "electronics",
            DeviceType::WaterHeater => "water_heater",
            DeviceType::SolarPanel => "solar_panel",
            DeviceType::SmartMeter => "smart_meter",
            DeviceType::Other => "other",
        }
    }

    /// Human label used in prompts and fallback text.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Hvac => "HVAC",
            DeviceType::Lighting => "lighting",
            DeviceType::Appliance => "appliance",
            DeviceType::Electronics => "electronics",
            DeviceType::WaterHeater => "water heater",
            DeviceType::SolarPanel => "solar panel",
            DeviceType::SmartMeter => "smart meter",
            DeviceType::Other => "device",
        }
    }

    /// Devices that put energy back rather than draw it.
    pub fn is_generator(&self) -> bool {
        matches!(self, DeviceType::SolarPanel)
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown device type '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Timestamp of the latest reading appended for this device.
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, device_type: DeviceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            device_type,
            model: None,
            manufacturer: None,
            location: None,
            rated_power_watts: None,
            is_smart_device: false,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_seen: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_round_trips_through_str() {
        for t in DeviceType::ALL {
            assert_eq!(t.as_str().parse::<DeviceType>().unwrap(), t);
        }
        assert_eq!("HVAC".parse::<DeviceType>().unwrap(), DeviceType::Hvac);
        assert!("toaster".parse::<DeviceType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&DeviceType::WaterHeater).unwrap();
        assert_eq!(json, "\"water_heater\"");
    }
}
