//! Device API handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};

use super::dto::{
    CreateDeviceRequest, DeviceDeletedDto, DeviceDetailParams, DeviceDto, DeviceWithReadingsDto,
    ListDevicesParams, UpdateDeviceRequest,
};
use crate::interfaces::http::common::{
    domain_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson, ValidatedQuery,
};
use crate::interfaces::http::modules::energy::EnergyDataDto;
use crate::interfaces::http::modules::users::RecordState;
use crate::shared::Page;

const DEFAULT_DETAIL_HOURS: u32 = 24;

#[utoipa::path(
    post,
    path = "/api/v1/energy/users/{user_id}/devices",
    tag = "Devices",
    params(("user_id" = String, Path, description = "Owner user ID")),
    request_body = CreateDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = ApiResponse<DeviceDto>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn add_device(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeviceDto>>), ApiError> {
    let device = state
        .records
        .add_device(&user_id, req.into())
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(device.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users/{user_id}/devices",
    tag = "Devices",
    params(("user_id" = String, Path, description = "Owner user ID"), ListDevicesParams),
    responses(
        (status = 200, description = "Devices of the user", body = ApiResponse<Vec<DeviceDto>>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_devices(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<ListDevicesParams>,
) -> ApiResult<Vec<DeviceDto>> {
    let all = state
        .records
        .list_devices(&user_id, Page::new(None, Some(Page::MAX_LIMIT)))
        .await
        .map_err(domain_error)?;
    let page = Page::new(params.skip, params.limit);
    let devices = page.slice(
        all.into_iter()
            .filter(|d| params.include_inactive || d.is_active),
    );
    ok(devices.into_iter().map(DeviceDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/devices/{device_id}",
    tag = "Devices",
    params(("device_id" = String, Path, description = "Device ID"), DeviceDetailParams),
    responses(
        (status = 200, description = "Device with recent readings", body = ApiResponse<DeviceWithReadingsDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_device(
    State(state): State<RecordState>,
    Path(device_id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<DeviceDetailParams>,
) -> ApiResult<DeviceWithReadingsDto> {
    let hours = params.hours.unwrap_or(DEFAULT_DETAIL_HOURS);
    let device = state
        .records
        .get_device(&device_id)
        .await
        .map_err(domain_error)?;
    let since = Utc::now() - Duration::hours(i64::from(hours));
    let readings = state
        .records
        .device_readings(&device_id, Some(since), None, None)
        .await
        .map_err(domain_error)?;
    ok(DeviceWithReadingsDto {
        device: device.into(),
        hours,
        recent_readings: readings.into_iter().map(EnergyDataDto::from).collect(),
    })
}

#[utoipa::path(
    put,
    path = "/api/v1/energy/devices/{device_id}",
    tag = "Devices",
    params(("device_id" = String, Path, description = "Device ID")),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Device updated", body = ApiResponse<DeviceDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_device(
    State(state): State<RecordState>,
    Path(device_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateDeviceRequest>,
) -> ApiResult<DeviceDto> {
    let device = state
        .records
        .update_device(&device_id, req.into())
        .await
        .map_err(domain_error)?;
    ok(device.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/energy/devices/{device_id}",
    tag = "Devices",
    params(("device_id" = String, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device and its readings deleted", body = ApiResponse<DeviceDeletedDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_device(
    State(state): State<RecordState>,
    Path(device_id): Path<String>,
) -> ApiResult<DeviceDeletedDto> {
    let removed = state
        .records
        .delete_device(&device_id)
        .await
        .map_err(domain_error)?;
    ok(DeviceDeletedDto {
        device_id,
        energy_records_deleted: removed,
    })
}
