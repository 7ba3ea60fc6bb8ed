//! Energy reading API handlers
//!
//! Readings are append-only apart from explicit corrections, which replace
//! the measured values and re-derive the cost.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::{CreateEnergyDataRequest, EnergyDataDto, MeasurementRequest, ReadingsQuery};
use crate::interfaces::http::common::{
    domain_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson, ValidatedQuery,
};
use crate::interfaces::http::modules::users::RecordState;

#[utoipa::path(
    post,
    path = "/api/v1/energy/devices/{device_id}/energy-data",
    tag = "Energy Data",
    params(("device_id" = String, Path, description = "Device ID")),
    request_body = CreateEnergyDataRequest,
    responses(
        (status = 201, description = "Reading recorded", body = ApiResponse<EnergyDataDto>),
        (status = 404, description = "Device not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn record_energy(
    State(state): State<RecordState>,
    Path(device_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateEnergyDataRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EnergyDataDto>>), ApiError> {
    let data = state
        .records
        .record_energy(&device_id, req.into())
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/devices/{device_id}/energy-data",
    tag = "Energy Data",
    params(("device_id" = String, Path, description = "Device ID"), ReadingsQuery),
    responses(
        (status = 200, description = "Readings in timestamp order", body = ApiResponse<Vec<EnergyDataDto>>),
        (status = 404, description = "Device not found"),
        (status = 422, description = "Start after end")
    )
)]
pub async fn list_device_readings(
    State(state): State<RecordState>,
    Path(device_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ReadingsQuery>,
) -> ApiResult<Vec<EnergyDataDto>> {
    let records = state
        .records
        .device_readings(&device_id, query.start, query.end, Some(query.page()))
        .await
        .map_err(domain_error)?;
    ok(records.into_iter().map(EnergyDataDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users/{user_id}/energy-data",
    tag = "Energy Data",
    params(("user_id" = String, Path, description = "User ID"), ReadingsQuery),
    responses(
        (status = 200, description = "Readings across all of the user's devices", body = ApiResponse<Vec<EnergyDataDto>>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Start after end")
    )
)]
pub async fn list_user_readings(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ReadingsQuery>,
) -> ApiResult<Vec<EnergyDataDto>> {
    let records = state
        .records
        .user_readings(&user_id, query.start, query.end, Some(query.page()))
        .await
        .map_err(domain_error)?;
    ok(records.into_iter().map(EnergyDataDto::from).collect())
}

#[utoipa::path(
    put,
    path = "/api/v1/energy/energy-data/{record_id}",
    tag = "Energy Data",
    params(("record_id" = String, Path, description = "Reading ID")),
    request_body = MeasurementRequest,
    responses(
        (status = 200, description = "Reading corrected", body = ApiResponse<EnergyDataDto>),
        (status = 404, description = "Reading not found")
    )
)]
pub async fn correct_energy(
    State(state): State<RecordState>,
    Path(record_id): Path<String>,
    ValidatedJson(req): ValidatedJson<MeasurementRequest>,
) -> ApiResult<EnergyDataDto> {
    let data = state
        .records
        .correct_energy(&record_id, req.into())
        .await
        .map_err(domain_error)?;
    ok(data.into())
}
