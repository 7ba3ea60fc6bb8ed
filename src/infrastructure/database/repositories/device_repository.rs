use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::db_err;
use crate::domain::{Device, DeviceRepository, DomainError, DomainResult};
use crate::infrastructure::database::entities::device;
use crate::shared::Page;

pub struct SeaOrmDeviceRepository {
    db: DatabaseConnection,
}

impl SeaOrmDeviceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(model: device::Model) -> Device {
    Device {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        device_type: model.device_type.into(),
        model: model.model,
        manufacturer: model.manufacturer,
        location: model.location,
        rated_power_watts: model.rated_power_watts,
        is_smart_device: model.is_smart_device,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_seen: model.last_seen,
    }
}

fn domain_to_active(d: &Device) -> device::ActiveModel {
    device::ActiveModel {
        id: Set(d.id.clone()),
        user_id: Set(d.user_id.clone()),
        name: Set(d.name.clone()),
        device_type: Set(d.device_type.into()),
        model: Set(d.model.clone()),
        manufacturer: Set(d.manufacturer.clone()),
        location: Set(d.location.clone()),
        rated_power_watts: Set(d.rated_power_watts),
        is_smart_device: Set(d.is_smart_device),
        is_active: Set(d.is_active),
        created_at: Set(d.created_at),
        updated_at: Set(d.updated_at),
        last_seen: Set(d.last_seen),
    }
}

#[async_trait]
impl DeviceRepository for SeaOrmDeviceRepository {
    async fn save(&self, d: Device) -> DomainResult<Device> {
        let model = domain_to_active(&d).insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Device>> {
        Ok(device::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain))
    }

    async fn find_by_user(&self, user_id: &str, page: Page) -> DomainResult<Vec<Device>> {
        let models = device::Entity::find()
            .filter(device::Column::UserId.eq(user_id))
            .order_by_asc(device::Column::CreatedAt)
            .order_by_asc(device::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, d: Device) -> DomainResult<Device> {
        if self.find_by_id(&d.id).await?.is_none() {
            return Err(DomainError::not_found("Device", &d.id));
        }
        let model = domain_to_active(&d).update(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn touch_last_seen(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        let result = device::Entity::update_many()
            .col_expr(device::Column::LastSeen, Expr::value(at))
            .filter(device::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(device::Column::LastSeen.is_null())
                    .add(device::Column::LastSeen.lt(at)),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 && self.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("Device", id));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = device::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Device", id));
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64> {
        let result = device::Entity::delete_many()
            .filter(device::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}
