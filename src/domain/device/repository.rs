use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Device;
use crate::domain::DomainResult;
use crate::shared::Page;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn save(&self, device: Device) -> DomainResult<Device>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Device>>;
    /// Devices of one user ordered by creation time, inactive ones included.
    async fn find_by_user(&self, user_id: &str, page: Page) -> DomainResult<Vec<Device>>;

    async fn update(&self, device: Device) -> DomainResult<Device>;
    /// Move `last_seen` forward; older timestamps are ignored.
    async fn touch_last_seen(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()>;

    async fn delete(&self, id: &str) -> DomainResult<()>;
    /// Returns the number of devices removed.
    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64>;
}
