//! Statistics DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::analytics::{DailyStats, DailyStatsReport, EnergySummary};
use crate::domain::TimeWindow;

/// Half-open `[start, end)` interval in UTC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct WindowDto {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<TimeWindow> for WindowDto {
    fn from(w: TimeWindow) -> Self {
        Self {
            start: w.start,
            end: w.end,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyStatsDto {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub consumption_kwh: f64,
    pub production_kwh: f64,
    pub net_energy_kwh: f64,
    pub cost: f64,
    pub record_count: u64,
    pub average_power_watts: Option<f64>,
    pub peak_power_watts: Option<f64>,
    pub average_temperature_celsius: Option<f64>,
}

impl From<DailyStats> for DailyStatsDto {
    fn from(d: DailyStats) -> Self {
        Self {
            date: d.date,
            consumption_kwh: d.consumption_kwh,
            production_kwh: d.production_kwh,
            net_energy_kwh: d.net_energy_kwh,
            cost: d.cost,
            record_count: d.record_count,
            average_power_watts: d.average_power_watts,
            peak_power_watts: d.peak_power_watts,
            average_temperature_celsius: d.average_temperature_celsius,
        }
    }
}

/// Totals over a window, with one entry per day that has readings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnergySummaryDto {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub total_consumption_kwh: f64,
    pub total_production_kwh: f64,
    pub net_energy_kwh: f64,
    pub total_cost: f64,
    pub record_count: u64,
    pub device_count: u64,
    pub average_consumption_kwh: f64,
    pub average_daily_consumption_kwh: f64,
    pub average_power_watts: Option<f64>,
    pub peak_power_watts: Option<f64>,
    pub daily_breakdown: Vec<DailyStatsDto>,
}

impl From<EnergySummary> for EnergySummaryDto {
    fn from(s: EnergySummary) -> Self {
        Self {
            average_daily_consumption_kwh: s.average_daily_consumption_kwh(),
            period_start: s.period_start,
            period_end: s.period_end,
            total_consumption_kwh: s.total_consumption_kwh,
            total_production_kwh: s.total_production_kwh,
            net_energy_kwh: s.net_energy_kwh,
            total_cost: s.total_cost,
            record_count: s.record_count,
            device_count: s.device_count,
            average_consumption_kwh: s.average_consumption_kwh,
            average_power_watts: s.average_power_watts,
            peak_power_watts: s.peak_power_watts,
            daily_breakdown: s.daily.into_iter().map(DailyStatsDto::from).collect(),
        }
    }
}

/// Gap-free daily series ending today
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyStatsReportDto {
    pub user_id: String,
    pub window: WindowDto,
    pub total_consumption_kwh: f64,
    pub total_cost: f64,
    pub daily_stats: Vec<DailyStatsDto>,
}

impl DailyStatsReportDto {
    pub fn new(user_id: String, report: DailyStatsReport) -> Self {
        Self {
            user_id,
            window: report.window.into(),
            total_consumption_kwh: report.total_consumption_kwh,
            total_cost: report.total_cost,
            daily_stats: report.days.into_iter().map(DailyStatsDto::from).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Inclusive lower bound; defaults to 30 days before `end`
    #[serde(alias = "start_date")]
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound; defaults to now
    #[serde(alias = "end_date")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyStatsQuery {
    /// Number of calendar days, 1-365 (default 30)
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}
