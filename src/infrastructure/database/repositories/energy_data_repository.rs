use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

use super::db_err;
use crate::domain::{
    DomainError, DomainResult, EnergyData, EnergyDataRepository, EnergyQuery, RecordScope,
};
use crate::infrastructure::database::entities::energy_data;

pub struct SeaOrmEnergyDataRepository {
    db: DatabaseConnection,
}

impl SeaOrmEnergyDataRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: energy_data::Model) -> EnergyData {
    EnergyData {
        id: m.id,
        device_id: m.device_id,
        user_id: m.user_id,
        timestamp: m.timestamp,
        consumption_kwh: m.consumption_kwh,
        production_kwh: m.production_kwh,
        power_watts: m.power_watts,
        voltage: m.voltage,
        current_amps: m.current_amps,
        temperature_celsius: m.temperature_celsius,
        humidity_percent: m.humidity_percent,
        cost: m.cost,
        created_at: m.created_at,
    }
}

fn domain_to_active(d: &EnergyData) -> energy_data::ActiveModel {
    energy_data::ActiveModel {
        id: Set(d.id.clone()),
        device_id: Set(d.device_id.clone()),
        user_id: Set(d.user_id.clone()),
        timestamp: Set(d.timestamp),
        consumption_kwh: Set(d.consumption_kwh),
        production_kwh: Set(d.production_kwh),
        power_watts: Set(d.power_watts),
        voltage: Set(d.voltage),
        current_amps: Set(d.current_amps),
        temperature_celsius: Set(d.temperature_celsius),
        humidity_percent: Set(d.humidity_percent),
        cost: Set(d.cost),
        created_at: Set(d.created_at),
    }
}

fn filtered(query: &EnergyQuery) -> Select<energy_data::Entity> {
    let mut select = match &query.scope {
        RecordScope::User(id) => energy_data::Entity::find().filter(energy_data::Column::UserId.eq(id.as_str())),
        RecordScope::Device(id) => {
            energy_data::Entity::find().filter(energy_data::Column::DeviceId.eq(id.as_str()))
        }
    };
    if let Some(start) = query.start {
        select = select.filter(energy_data::Column::Timestamp.gte(start));
    }
    if let Some(end) = query.end {
        select = select.filter(energy_data::Column::Timestamp.lt(end));
    }
    select
        .order_by_asc(energy_data::Column::Timestamp)
        .order_by_asc(energy_data::Column::CreatedAt)
        .order_by_asc(energy_data::Column::Id)
}

#[async_trait]
impl EnergyDataRepository for SeaOrmEnergyDataRepository {
    async fn save(&self, data: EnergyData) -> DomainResult<EnergyData> {
        let model = domain_to_active(&data).insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<EnergyData>> {
        Ok(energy_data::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain))
    }

    async fn find(&self, query: EnergyQuery) -> DomainResult<Vec<EnergyData>> {
        let mut select = filtered(&query);
        if let Some(page) = query.page {
            select = select.offset(page.skip).limit(page.limit);
        }
        let models = select.all(&self.db).await.map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, data: EnergyData) -> DomainResult<EnergyData> {
        if self.find_by_id(&data.id).await?.is_none() {
            return Err(DomainError::not_found("EnergyData", &data.id));
        }
        let model = domain_to_active(&data).update(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn delete_by_device(&self, device_id: &str) -> DomainResult<u64> {
        let result = energy_data::Entity::delete_many()
            .filter(energy_data::Column::DeviceId.eq(device_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64> {
        let result = energy_data::Entity::delete_many()
            .filter(energy_data::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}
