//! Recommendation API handlers
//!
//! These endpoints answer 200 even when the generator is down; the payload
//! then carries the rule-based fallback with `degraded: true`.

use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::Utc;

use super::dto::{
    AiStatusDto, AnalysisQuery, CompareQuery, ComparisonResponse, EfficiencyReportResponse,
    EnergyAnalysisResponse, OptimizationTipsResponse, RecommendationsQuery,
    RecommendationsResponse, TipsQuery,
};
use crate::application::recommendations::AnalysisPeriod;
use crate::application::RecommendationService;
use crate::interfaces::http::common::{domain_error, ok, ApiResponse, ApiResult, ValidatedQuery};

const DEFAULT_RECOMMENDATION_DAYS: u32 = 30;
const DEFAULT_TIPS_DAYS: u32 = 7;

/// Handler state for recommendation routes.
#[derive(Clone)]
pub struct AiState {
    pub recommendations: Arc<RecommendationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/users/{user_id}/recommendations",
    tag = "AI",
    params(("user_id" = String, Path, description = "User ID"), RecommendationsQuery),
    responses(
        (status = 200, description = "Recommendations (generated or fallback)", body = ApiResponse<RecommendationsResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn recommendations(
    State(state): State<AiState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<RecommendationsQuery>,
) -> ApiResult<RecommendationsResponse> {
    let days = query.days.unwrap_or(DEFAULT_RECOMMENDATION_DAYS);
    let result = state
        .recommendations
        .general_recommendations(&user_id, days, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(result.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/users/{user_id}/energy-analysis",
    tag = "AI",
    params(("user_id" = String, Path, description = "User ID"), AnalysisQuery),
    responses(
        (status = 200, description = "Usage pattern insights", body = ApiResponse<EnergyAnalysisResponse>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Unknown time period")
    )
)]
pub async fn energy_analysis(
    State(state): State<AiState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<AnalysisQuery>,
) -> ApiResult<EnergyAnalysisResponse> {
    let period = match query.time_period.as_deref() {
        Some(p) => p.parse::<AnalysisPeriod>().map_err(domain_error)?,
        None => AnalysisPeriod::default(),
    };
    let result = state
        .recommendations
        .energy_analysis(&user_id, period, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(result.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/devices/{device_id}/optimization-tips",
    tag = "AI",
    params(("device_id" = String, Path, description = "Device ID"), TipsQuery),
    responses(
        (status = 200, description = "Device optimization tips", body = ApiResponse<OptimizationTipsResponse>),
        (status = 404, description = "Device not found")
    )
)]
pub async fn optimization_tips(
    State(state): State<AiState>,
    Path(device_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<TipsQuery>,
) -> ApiResult<OptimizationTipsResponse> {
    let days = query.days.unwrap_or(DEFAULT_TIPS_DAYS);
    let result = state
        .recommendations
        .device_tips(&device_id, days, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(result.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/users/{user_id}/compare-usage",
    tag = "AI",
    params(("user_id" = String, Path, description = "User ID"), CompareQuery),
    responses(
        (status = 200, description = "Period comparison with insights", body = ApiResponse<ComparisonResponse>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Invalid preset or day count")
    )
)]
pub async fn compare_usage(
    State(state): State<AiState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<CompareQuery>,
) -> ApiResult<ComparisonResponse> {
    let result = state
        .recommendations
        .usage_comparison(&user_id, query.spec(), Utc::now())
        .await
        .map_err(domain_error)?;
    ok(result.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/ai/users/{user_id}/efficiency-report",
    tag = "AI",
    params(("user_id" = String, Path, description = "User ID"), RecommendationsQuery),
    responses(
        (status = 200, description = "Per-device efficiency report", body = ApiResponse<EfficiencyReportResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn efficiency_report(
    State(state): State<AiState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<RecommendationsQuery>,
) -> ApiResult<EfficiencyReportResponse> {
    let days = query.days.unwrap_or(DEFAULT_RECOMMENDATION_DAYS);
    let result = state
        .recommendations
        .efficiency_report(&user_id, days, Utc::now())
        .await
        .map_err(domain_error)?;
    ok(result.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/ai/ai-status",
    tag = "AI",
    responses(
        (status = 200, description = "Generator configuration", body = ApiResponse<AiStatusDto>)
    )
)]
pub async fn ai_status(State(state): State<AiState>) -> ApiResult<AiStatusDto> {
    ok(state.recommendations.status().into())
}
