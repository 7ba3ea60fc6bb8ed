//! Application services: record management, analytics and recommendations.

pub mod analytics;
pub mod records;
pub mod recommendations;

pub use analytics::{AnalyticsService, ComparisonPreset, ComparisonSpec};
pub use records::RecordService;
pub use recommendations::{RecommendationClient, RecommendationService};
