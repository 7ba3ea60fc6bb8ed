//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::application::records::{DeletionReport, NewUser, UserChanges};
use crate::domain::{EnergyUnit, User};
use crate::interfaces::http::modules::devices::DeviceDto;
use crate::shared::Page;

pub(crate) fn validate_unit(unit: &str) -> Result<(), ValidationError> {
    unit.parse::<EnergyUnit>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unit").with_message("must be 'kwh' or 'wh'".into()))
}

fn parse_unit(unit: Option<String>) -> Option<EnergyUnit> {
    // Already validated.
    unit.and_then(|u| u.parse().ok())
}

/// User API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub is_active: bool,
    /// Monthly consumption goal in kWh
    pub energy_goal_kwh: Option<f64>,
    pub savings_target_percent: Option<f64>,
    pub preferred_temperature_celsius: Option<f64>,
    /// "kwh" or "wh"
    pub preferred_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            full_name: u.full_name,
            is_active: u.is_active,
            energy_goal_kwh: u.energy_goal_kwh,
            savings_target_percent: u.savings_target_percent,
            preferred_temperature_celsius: u.preferred_temperature_celsius,
            preferred_unit: u.preferred_unit.to_string(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// User together with their devices
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserWithDevicesDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub devices: Vec<DeviceDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    #[validate(range(min = 0.0))]
    pub energy_goal_kwh: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub savings_target_percent: Option<f64>,
    #[validate(range(min = -50.0, max = 60.0))]
    pub preferred_temperature_celsius: Option<f64>,
    #[validate(custom(function = "validate_unit"))]
    pub preferred_unit: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            email: r.email,
            username: r.username,
            full_name: r.full_name,
            energy_goal_kwh: r.energy_goal_kwh,
            savings_target_percent: r.savings_target_percent,
            preferred_temperature_celsius: r.preferred_temperature_celsius,
            preferred_unit: parse_unit(r.preferred_unit),
        }
    }
}

/// Partial update; omitted fields keep their value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub username: Option<String>,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0.0))]
    pub energy_goal_kwh: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub savings_target_percent: Option<f64>,
    #[validate(range(min = -50.0, max = 60.0))]
    pub preferred_temperature_celsius: Option<f64>,
    #[validate(custom(function = "validate_unit"))]
    pub preferred_unit: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            email: r.email,
            username: r.username,
            full_name: r.full_name,
            is_active: r.is_active,
            energy_goal_kwh: r.energy_goal_kwh,
            savings_target_percent: r.savings_target_percent,
            preferred_temperature_celsius: r.preferred_temperature_celsius,
            preferred_unit: parse_unit(r.preferred_unit),
        }
    }
}

/// Offset pagination for list endpoints
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Items to skip (default 0)
    pub skip: Option<u64>,
    /// Page size, 1-1000 (default 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

impl ListParams {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDeletedDto {
    pub user_id: String,
    pub devices_deleted: u64,
    pub energy_records_deleted: u64,
}

impl UserDeletedDto {
    pub fn new(user_id: String, report: DeletionReport) -> Self {
        Self {
            user_id,
            devices_deleted: report.devices,
            energy_records_deleted: report.energy_records,
        }
    }
}
