//! User entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub energy_goal_kwh: Option<f64>,
    pub savings_target_percent: Option<f64>,
    pub preferred_temperature_celsius: Option<f64>,
    /// "kwh" or "wh"
    pub preferred_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::device::Entity")]
    Devices,
    #[sea_orm(has_many = "super::energy_data::Entity")]
    EnergyData,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
}

impl Related<super::energy_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnergyData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
