//! Domain layer: records, value objects and repository ports.

pub mod device;
pub mod energy;
pub mod repositories;
pub mod user;

pub use device::{Device, DeviceRepository, DeviceType};
pub use energy::{
    EnergyData, EnergyDataRepository, EnergyQuery, Measurement, Pricing, RecordScope, TimeWindow,
    MAX_MEASUREMENT,
};
pub use repositories::{CascadeCounts, DomainResult, RepositoryProvider};
pub use user::{EnergyGoal, EnergyUnit, User, UserRepository};

pub use crate::shared::errors::DomainError;
