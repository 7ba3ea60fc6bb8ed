//! User management API handlers
//!
//! CRUD endpoints for users. Deleting a user removes their devices and
//! readings too.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::{
    CreateUserRequest, ListParams, UpdateUserRequest, UserDeletedDto, UserDto, UserWithDevicesDto,
};
use crate::application::RecordService;
use crate::interfaces::http::common::{
    domain_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson, ValidatedQuery,
};
use crate::interfaces::http::modules::devices::DeviceDto;

/// Handler state for user, device and reading routes.
#[derive(Clone)]
pub struct RecordState {
    pub records: Arc<RecordService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/energy/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 409, description = "Email or username taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<RecordState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .records
        .create_user(req.into())
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users",
    tag = "Users",
    params(ListParams),
    responses(
        (status = 200, description = "Active users", body = ApiResponse<Vec<UserDto>>)
    )
)]
pub async fn list_users(
    State(state): State<RecordState>,
    ValidatedQuery(params): ValidatedQuery<ListParams>,
) -> ApiResult<Vec<UserDto>> {
    let users = state
        .records
        .list_users(params.page())
        .await
        .map_err(domain_error)?;
    ok(users.into_iter().map(UserDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/energy/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with devices", body = ApiResponse<UserWithDevicesDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserWithDevicesDto> {
    let user = state.records.get_user(&user_id).await.map_err(domain_error)?;
    let devices = state
        .records
        .all_devices(&user_id)
        .await
        .map_err(domain_error)?;
    ok(UserWithDevicesDto {
        user: user.into(),
        devices: devices.into_iter().map(DeviceDto::from).collect(),
    })
}

#[utoipa::path(
    put,
    path = "/api/v1/energy/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn update_user(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDto> {
    let user = state
        .records
        .update_user(&user_id, req.into())
        .await
        .map_err(domain_error)?;
    ok(user.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/energy/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and everything they own deleted", body = ApiResponse<UserDeletedDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserDeletedDto> {
    let report = state
        .records
        .delete_user(&user_id)
        .await
        .map_err(domain_error)?;
    ok(UserDeletedDto::new(user_id, report))
}
