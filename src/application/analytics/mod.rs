//! Energy analytics: aggregation, comparison and efficiency scoring.

pub mod comparison;
pub mod efficiency;
pub mod service;
pub mod statistics;

pub use comparison::{
    compare, compare_summaries, ComparisonPreset, ComparisonWindows, DeltaReport, MetricDelta,
    Trend, UsageComparison,
};
pub use efficiency::{DeviceEfficiency, EfficiencyReport};
pub use service::{
    AnalyticsService, ComparisonSpec, DailyStatsReport, DeviceSnapshot, UserSnapshot, MAX_WINDOW_DAYS,
};
pub use statistics::{daily_series, summarize, DailyStats, EnergySummary};
