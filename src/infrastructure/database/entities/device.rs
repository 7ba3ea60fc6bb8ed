//! Device entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::DeviceType;

/// Device category as stored in the `device_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DeviceKind {
    #[sea_orm(string_value = "hvac")]
    Hvac,
    #[sea_orm(string_value = "lighting")]
    Lighting,
    #[sea_orm(string_value = "appliance")]
    Appliance,
    #[sea_orm(string_value = "electronics")]
    Electronics,
    #[sea_orm(string_value = "water_heater")]
    WaterHeater,
    #[sea_orm(string_value = "solar_panel")]
    SolarPanel,
    #[sea_orm(string_value = "smart_meter")]
    SmartMeter,
    #[sea_orm(string_value = "other")]
    Other,
}

impl From<DeviceType> for DeviceKind {
    fn from(t: DeviceType) -> Self {
        match t {
            DeviceType::Hvac => DeviceKind::Hvac,
            DeviceType::Lighting => DeviceKind::Lighting,
            DeviceType::Appliance => DeviceKind::Appliance,
            DeviceType::Electronics => DeviceKind::Electronics,
            DeviceType::WaterHeater => DeviceKind::WaterHeater,
            DeviceType::SolarPanel => DeviceKind::SolarPanel,
            DeviceType::SmartMeter => DeviceKind::SmartMeter,
            DeviceType::Other => DeviceKind::Other,
        }
    }
}

impl From<DeviceKind> for DeviceType {
    fn from(k: DeviceKind) -> Self {
        match k {
            DeviceKind::Hvac => DeviceType::Hvac,
            DeviceKind::Lighting => DeviceType::Lighting,
            DeviceKind::Appliance => DeviceType::Appliance,
            DeviceKind::Electronics => DeviceType::Electronics,
            DeviceKind::WaterHeater => DeviceType::WaterHeater,
            DeviceKind::SolarPanel => DeviceType::SolarPanel,
            DeviceKind::SmartMeter => DeviceType::SmartMeter,
            DeviceKind::Other => DeviceType::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub device_type: DeviceKind,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub rated_power_watts: Option<f64>,
    pub is_smart_device: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::energy_data::Entity")]
    EnergyData,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::energy_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnergyData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
