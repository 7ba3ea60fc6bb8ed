//! Statistics API handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::Utc;

use super::dto::{DailyStatsQuery, DailyStatsReportDto, EnergySummaryDto, StatsQuery};
use crate::application::AnalyticsService;
use crate::interfaces::http::common::{domain_error, ok, ApiResponse, ApiResult, ValidatedQuery};

const DEFAULT_DAILY_DAYS: u32 = 30;

/// Handler state for statistics routes.
#[derive(Clone)]
pub struct StatisticsState {
    pub analytics: Arc<AnalyticsService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users/{user_id}/energy-stats",
    tag = "Statistics",
    params(("user_id" = String, Path, description = "User ID"), StatsQuery),
    responses(
        (status = 200, description = "Energy summary", body = ApiResponse<EnergySummaryDto>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Start after end")
    )
)]
pub async fn user_stats(
    State(state): State<StatisticsState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<StatsQuery>,
) -> ApiResult<EnergySummaryDto> {
    let summary = state
        .analytics
        .user_summary(&user_id, query.start, query.end, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(summary.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/devices/{device_id}/energy-stats",
    tag = "Statistics",
    params(("device_id" = String, Path, description = "Device ID"), StatsQuery),
    responses(
        (status = 200, description = "Energy summary", body = ApiResponse<EnergySummaryDto>),
        (status = 404, description = "Device not found"),
        (status = 422, description = "Start after end")
    )
)]
pub async fn device_stats(
    State(state): State<StatisticsState>,
    Path(device_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<StatsQuery>,
) -> ApiResult<EnergySummaryDto> {
    let summary = state
        .analytics
        .device_summary(&device_id, query.start, query.end, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(summary.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users/{user_id}/daily-stats",
    tag = "Statistics",
    params(("user_id" = String, Path, description = "User ID"), DailyStatsQuery),
    responses(
        (status = 200, description = "Daily series", body = ApiResponse<DailyStatsReportDto>),
        (status = 404, description = "User not found")
    )
)]
pub async fn daily_stats(
    State(state): State<StatisticsState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<DailyStatsQuery>,
) -> ApiResult<DailyStatsReportDto> {
    let days = query.days.unwrap_or(DEFAULT_DAILY_DAYS);
    let report = state
        .analytics
        .daily_stats(&user_id, days, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(DailyStatsReportDto::new(user_id, report))
}
