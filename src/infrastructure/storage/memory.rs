//! In-memory storage implementation
//!
//! Backs `database.url = "memory"` and the test suites. Data lives only as
//! long as the provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{
    Device, DeviceRepository, DomainError, DomainResult, EnergyData, EnergyDataRepository,
    EnergyQuery, RepositoryProvider, User, UserRepository,
};
use crate::shared::Page;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

#[derive(Default)]
pub struct InMemoryDeviceRepository {
    devices: DashMap<String, Device>,
}

#[derive(Default)]
pub struct InMemoryEnergyDataRepository {
    records: DashMap<String, EnergyData>,
}

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    users: InMemoryUserRepository,
    devices: InMemoryDeviceRepository,
    energy_data: InMemoryEnergyDataRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
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
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn missing(entity: &'static str, id: &str) -> DomainError {
    DomainError::not_found(entity, id)
}

// ── Users ───────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: User) -> DomainResult<User> {
        if self.users.contains_key(&user.id) {
            return Err(DomainError::Conflict(format!("User {} already exists", user.id)));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn find_all(&self, page: Page) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.is_active)
            .map(|u| u.clone())
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.slice(users))
    }

    async fn update(&self, user: User) -> DomainResult<User> {
        let mut entry = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| missing("User", &user.id))?;
        *entry = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("User", id))
    }
}

// ── Devices ─────────────────────────────────────────────────────

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn save(&self, device: Device) -> DomainResult<Device> {
        if self.devices.contains_key(&device.id) {
            return Err(DomainError::Conflict(format!("Device {} already exists", device.id)));
        }
        self.devices.insert(device.id.clone(), device.clone());
        Ok(device)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Device>> {
        Ok(self.devices.get(id).map(|d| d.clone()))
    }

    async fn find_by_user(&self, user_id: &str, page: Page) -> DomainResult<Vec<Device>> {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.clone())
            .collect();
        devices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.slice(devices))
    }

    async fn update(&self, device: Device) -> DomainResult<Device> {
        let mut entry = self
            .devices
            .get_mut(&device.id)
            .ok_or_else(|| missing("Device", &device.id))?;
        *entry = device.clone();
        Ok(device)
    }

    async fn touch_last_seen(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        let mut entry = self.devices.get_mut(id).ok_or_else(|| missing("Device", id))?;
        if entry.last_seen.map_or(true, |seen| at > seen) {
            entry.last_seen = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.devices
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("Device", id))
    }

    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64> {
        Ok(remove_where(&self.devices, |d| d.user_id == user_id))
    }
}

/// Counts inside `retain`, so concurrent inserts do not skew the result.
fn remove_where<V>(map: &DashMap<String, V>, matches: impl Fn(&V) -> bool) -> u64 {
    let mut removed = 0;
    map.retain(|_, v| {
        let hit = matches(v);
        if hit {
            removed += 1;
        }
        !hit
    });
    removed
}

// ── Energy data ─────────────────────────────────────────────────

#[async_trait]
impl EnergyDataRepository for InMemoryEnergyDataRepository {
    async fn save(&self, data: EnergyData) -> DomainResult<EnergyData> {
        self.records.insert(data.id.clone(), data.clone());
        Ok(data)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<EnergyData>> {
        Ok(self.records.get(id).map(|r| r.clone()))
    }

    async fn find(&self, query: EnergyQuery) -> DomainResult<Vec<EnergyData>> {
        let mut found: Vec<EnergyData> = self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .map(|r| r.clone())
            .collect();
        found.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(match query.page {
            Some(page) => page.slice(found),
            None => found,
        })
    }

    async fn update(&self, data: EnergyData) -> DomainResult<EnergyData> {
        let mut entry = self
            .records
            .get_mut(&data.id)
            .ok_or_else(|| missing("EnergyData", &data.id))?;
        *entry = data.clone();
        Ok(data)
    }

    async fn delete_by_device(&self, device_id: &str) -> DomainResult<u64> {
        Ok(remove_where(&self.records, |r| r.device_id == device_id))
    }

    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64> {
        Ok(remove_where(&self.records, |r| r.user_id == user_id))
    }
}
