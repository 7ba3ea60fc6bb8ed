use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{EnergyData, TimeWindow};
use crate::domain::DomainResult;
use crate::shared::Page;

/// Whose readings a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    User(String),
    Device(String),
}

/// Filter for [`EnergyDataRepository::find`]. Bounds are `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyQuery {
    pub scope: RecordScope,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub page: Option<Page>,
}

impl EnergyQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self::scoped(RecordScope::User(user_id.into()))
    }

    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self::scoped(RecordScope::Device(device_id.into()))
    }

    pub fn scoped(scope: RecordScope) -> Self {
        Self {
            scope,
            start: None,
            end: None,
            page: None,
        }
    }

    pub fn between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn within(self, window: TimeWindow) -> Self {
        self.between(Some(window.start), Some(window.end))
    }

    pub fn paged(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Scope and bounds check; pagination is applied by the caller.
    pub fn matches(&self, data: &EnergyData) -> bool {
        let in_scope = match &self.scope {
            RecordScope::User(id) => &data.user_id == id,
            RecordScope::Device(id) => &data.device_id == id,
        };
        in_scope
            && self.start.map_or(true, |s| data.timestamp >= s)
            && self.end.map_or(true, |e| data.timestamp < e)
    }
}

#[async_trait]
pub trait EnergyDataRepository: Send + Sync {
    async fn save(&self, data: EnergyData) -> DomainResult<EnergyData>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<EnergyData>>;
    /// Matching readings in ascending timestamp order.
    async fn find(&self, query: EnergyQuery) -> DomainResult<Vec<EnergyData>>;

    async fn update(&self, data: EnergyData) -> DomainResult<EnergyData>;

    /// Both return the number of readings removed.
    async fn delete_by_device(&self, device_id: &str) -> DomainResult<u64>;
    async fn delete_by_user(&self, user_id: &str) -> DomainResult<u64>;
}
