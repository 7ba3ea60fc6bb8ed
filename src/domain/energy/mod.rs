pub mod model;
pub mod pricing;
pub mod repository;
pub mod window;

pub use model::*;
pub use pricing::*;
pub use repository::*;
pub use window::*;
