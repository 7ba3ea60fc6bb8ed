use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, EnergyUnit, User, UserRepository};
use crate::infrastructure::database::entities::user;
use crate::shared::Page;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(model: user::Model) -> DomainResult<User> {
    let preferred_unit = model
        .preferred_unit
        .parse::<EnergyUnit>()
        .map_err(DomainError::Storage)?;
    Ok(User {
        id: model.id,
        email: model.email,
        username: model.username,
        full_name: model.full_name,
        is_active: model.is_active,
        energy_goal_kwh: model.energy_goal_kwh,
        savings_target_percent: model.savings_target_percent,
        preferred_temperature_celsius: model.preferred_temperature_celsius,
        preferred_unit,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn domain_to_active(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id.clone()),
        email: Set(u.email.clone()),
        username: Set(u.username.clone()),
        full_name: Set(u.full_name.clone()),
        is_active: Set(u.is_active),
        energy_goal_kwh: Set(u.energy_goal_kwh),
        savings_target_percent: Set(u.savings_target_percent),
        preferred_temperature_celsius: Set(u.preferred_temperature_celsius),
        preferred_unit: Set(u.preferred_unit.as_str().to_string()),
        created_at: Set(u.created_at),
        updated_at: Set(u.updated_at),
    }
}

fn conflict_or_db_err(e: sea_orm::DbErr) -> DomainError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") || msg.contains("duplicate") {
        DomainError::Conflict("Username or email already exists".to_string())
    } else {
        db_err(e)
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn save(&self, u: User) -> DomainResult<User> {
        let model = domain_to_active(&u)
            .insert(&self.db)
            .await
            .map_err(conflict_or_db_err)?;
        model_to_domain(model)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self, page: Page) -> DomainResult<Vec<User>> {
        user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn update(&self, u: User) -> DomainResult<User> {
        if self.find_by_id(&u.id).await?.is_none() {
            return Err(DomainError::not_found("User", &u.id));
        }
        let model = domain_to_active(&u)
            .update(&self.db)
            .await
            .map_err(conflict_or_db_err)?;
        model_to_domain(model)
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }
}
