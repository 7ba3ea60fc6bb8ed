pub mod ai;
pub mod devices;
pub mod energy;
pub mod health;
pub mod request_id;
pub mod statistics;
pub mod users;
