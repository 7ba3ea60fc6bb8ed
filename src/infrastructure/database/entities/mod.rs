//! Database entities module

pub mod device;
pub mod energy_data;
pub mod user;

pub use device::Entity as Device;
pub use energy_data::Entity as EnergyData;
pub use user::Entity as User;
