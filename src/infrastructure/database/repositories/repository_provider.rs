//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use tracing::debug;

use crate::domain::{
    CascadeCounts, DeviceRepository, DomainError, DomainResult, EnergyDataRepository,
    RepositoryProvider, UserRepository,
};
use crate::infrastructure::database::entities::{device, energy_data, user};

use super::db_err;
use super::device_repository::SeaOrmDeviceRepository;
use super::energy_data_repository::SeaOrmEnergyDataRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let device = repos.devices().find_by_id("d-1").await?;
/// let readings = repos.energy_data().find(EnergyQuery::for_device("d-1")).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    users: SeaOrmUserRepository,
    devices: SeaOrmDeviceRepository,
    energy_data: SeaOrmEnergyDataRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            devices: SeaOrmDeviceRepository::new(db.clone()),
            energy_data: SeaOrmEnergyDataRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn devices(&self) -> &dyn DeviceRepository {
        &self.devices
    }

    fn energy_data(&self) -> &dyn EnergyDataRepository {
        &self.energy_data
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db.ping().await.map_err(db_err)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn delete_user_cascade(&self, user_id: &str) -> DomainResult<CascadeCounts> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let energy_records = energy_data::Entity::delete_many()
            .filter(energy_data::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;
        let devices = device::Entity::delete_many()
            .filter(device::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;
        let users = user::Entity::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        if users == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::not_found("User", user_id));
        }
        txn.commit().await.map_err(db_err)?;
        debug!(user_id, devices, energy_records, "User cascade committed");

        Ok(CascadeCounts {
            devices,
            energy_records,
        })
    }

    async fn delete_device_cascade(&self, device_id: &str) -> DomainResult<u64> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = energy_data::Entity::delete_many()
            .filter(energy_data::Column::DeviceId.eq(device_id))
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;
        let devices = device::Entity::delete_by_id(device_id)
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        if devices == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::not_found("Device", device_id));
        }
        txn.commit().await.map_err(db_err)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Device, DeviceType, DomainError, EnergyData, EnergyQuery, EnergyUnit, Measurement,
        Pricing, User,
    };
    use crate::infrastructure::database::migrator::Migrator;
    use crate::shared::Page;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn user_round_trip_and_uniqueness() {
        let repos = provider().await;
        let mut user = User::new("a@example.com", "alex");
        user.energy_goal_kwh = Some(250.0);
        user.preferred_unit = EnergyUnit::Wh;
        repos.users().save(user.clone()).await.unwrap();

        let found = repos.users().find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.energy_goal_kwh, Some(250.0));
        assert_eq!(found.preferred_unit, EnergyUnit::Wh);

        let dup = repos.users().save(User::new("a@example.com", "other")).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));

        assert!(repos.users().find_by_username("nobody").await.unwrap().is_none());
        assert_eq!(repos.users().find_all(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn device_last_seen_moves_forward_only() {
        let repos = provider().await;
        let user = repos.users().save(User::new("b@example.com", "blake")).await.unwrap();
        let mut device = Device::new(&user.id, "Heater", DeviceType::WaterHeater);
        device.rated_power_watts = Some(3000.0);
        let device = repos.devices().save(device).await.unwrap();

        repos.devices().touch_last_seen(&device.id, ts(10)).await.unwrap();
        repos.devices().touch_last_seen(&device.id, ts(8)).await.unwrap();
        let stored = repos.devices().find_by_id(&device.id).await.unwrap().unwrap();
        assert_eq!(stored.last_seen, Some(ts(10)));
        assert_eq!(stored.device_type, DeviceType::WaterHeater);

        let missing = repos.devices().touch_last_seen("nope", ts(1)).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn energy_queries_are_ordered_bounded_and_paged() {
        let repos = provider().await;
        let user = repos.users().save(User::new("c@example.com", "cam")).await.unwrap();
        let device = repos
            .devices()
            .save(Device::new(&user.id, "AC", DeviceType::Hvac))
            .await
            .unwrap();
        let pricing = Pricing::new(0.2, "USD");
        for h in [5, 1, 3, 7] {
            let r = EnergyData::record(&device, ts(h), Measurement::consumption(2.0), &pricing);
            repos.energy_data().save(r).await.unwrap();
        }

        let all = repos.energy_data().find(EnergyQuery::for_user(&user.id)).await.unwrap();
        let hours: Vec<_> = all.iter().map(|r| r.timestamp).collect();
        assert_eq!(hours, vec![ts(1), ts(3), ts(5), ts(7)]);
        assert_eq!(all[0].cost, 0.4);

        let bounded = repos
            .energy_data()
            .find(EnergyQuery::for_device(&device.id).between(Some(ts(3)), Some(ts(7))))
            .await
            .unwrap();
        assert_eq!(bounded.len(), 2);

        let paged = repos
            .energy_data()
            .find(EnergyQuery::for_device(&device.id).paged(Page::new(Some(1), Some(2))))
            .await
            .unwrap();
        assert_eq!(paged.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![ts(3), ts(5)]);

        let window = repos
            .energy_data()
            .find(EnergyQuery::for_user(&user.id).between(Some(ts(0)), Some(ts(0) + Duration::hours(4))))
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let repos = provider().await;
        let user = repos.users().save(User::new("d@example.com", "drew")).await.unwrap();
        let device = repos
            .devices()
            .save(Device::new(&user.id, "TV", DeviceType::Electronics))
            .await
            .unwrap();
        let r = EnergyData::record(&device, ts(1), Measurement::consumption(1.0), &Pricing::default());
        repos.energy_data().save(r).await.unwrap();

        repos.users().delete(&user.id).await.unwrap();
        assert!(repos.devices().find_by_id(&device.id).await.unwrap().is_none());
        assert!(repos
            .energy_data()
            .find(EnergyQuery::for_device(&device.id))
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            repos.users().delete(&user.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn cascade_deletes_run_in_one_transaction() {
        let repos = provider().await;
        let user = repos.users().save(User::new("e@example.com", "eli")).await.unwrap();
        let fridge = repos
            .devices()
            .save(Device::new(&user.id, "Fridge", DeviceType::Appliance))
            .await
            .unwrap();
        let dryer = repos
            .devices()
            .save(Device::new(&user.id, "Dryer", DeviceType::Appliance))
            .await
            .unwrap();
        let pricing = Pricing::default();
        for (d, h) in [(&fridge, 1), (&dryer, 2), (&dryer, 3)] {
            let r = EnergyData::record(d, ts(h), Measurement::consumption(1.0), &pricing);
            repos.energy_data().save(r).await.unwrap();
        }

        assert_eq!(repos.delete_device_cascade(&dryer.id).await.unwrap(), 2);
        assert!(matches!(
            repos.delete_device_cascade(&dryer.id).await,
            Err(DomainError::NotFound { .. })
        ));

        let counts = repos.delete_user_cascade(&user.id).await.unwrap();
        assert_eq!(
            counts,
            CascadeCounts {
                devices: 1,
                energy_records: 1
            }
        );
        assert!(repos.users().find_by_id(&user.id).await.unwrap().is_none());
        assert!(matches!(
            repos.delete_user_cascade(&user.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ping_and_backend() {
        let repos = provider().await;
        repos.ping().await.unwrap();
        assert_eq!(repos.backend(), "sqlite");
    }
}
