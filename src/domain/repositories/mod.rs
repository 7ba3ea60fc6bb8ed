//! Repository traits for the domain layer

use async_trait::async_trait;

use super::device::DeviceRepository;
use super::energy::EnergyDataRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Rows removed by a cascading user delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeCounts {
    pub devices: u64,
    pub energy_records: u64,
}

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let device = repos.devices().find_by_id("d-1").await?;
///     let records = repos.energy_data().find(EnergyQuery::for_device("d-1")).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn devices(&self) -> &dyn DeviceRepository;
    fn energy_data(&self) -> &dyn EnergyDataRepository;

    /// Cheap liveness check of the backing store.
    async fn ping(&self) -> DomainResult<()>;

    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Remove a user with its devices and readings. Backends with
    /// transactions override this to make the removal atomic.
    async fn delete_user_cascade(&self, user_id: &str) -> DomainResult<CascadeCounts> {
        let energy_records = self.energy_data().delete_by_user(user_id).await?;
        let devices = self.devices().delete_by_user(user_id).await?;
        self.users().delete(user_id).await?;
        Ok(CascadeCounts {
            devices,
            energy_records,
        })
    }

    /// Remove a device with its readings; returns the readings removed.
    async fn delete_device_cascade(&self, device_id: &str) -> DomainResult<u64> {
        let removed = self.energy_data().delete_by_device(device_id).await?;
        self.devices().delete(device_id).await?;
        Ok(removed)
    }
}
