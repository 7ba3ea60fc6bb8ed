//! User, device and energy-reading management.

pub mod inputs;
pub mod service;

pub use inputs::*;
pub use service::RecordService;
