pub mod decimal;
pub mod retry;

pub use decimal::*;
pub use retry::*;
