//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::request_id::request_id_middleware;
use super::modules::{ai, devices, energy, health, statistics, users};
use crate::application::{AnalyticsService, RecommendationService, RecordService};
use crate::domain::RepositoryProvider;

/// Everything the handlers need. Each module extracts its own slice via
/// `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub records: Arc<RecordService>,
    pub analytics: Arc<AnalyticsService>,
    pub recommendations: Arc<RecommendationService>,
    pub started_at: Arc<Instant>,
}

impl FromRef<AppState> for users::RecordState {
    fn from_ref(s: &AppState) -> Self {
        users::RecordState {
            records: Arc::clone(&s.records),
        }
    }
}

impl FromRef<AppState> for statistics::StatisticsState {
    fn from_ref(s: &AppState) -> Self {
        statistics::StatisticsState {
            analytics: Arc::clone(&s.analytics),
        }
    }
}

impl FromRef<AppState> for ai::AiState {
    fn from_ref(s: &AppState) -> Self {
        ai::AiState {
            recommendations: Arc::clone(&s.recommendations),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        health::HealthState {
            repos: Arc::clone(&s.repos),
            recommendations: Arc::clone(&s.recommendations),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::root,
        health::health_check,
        // Users
        users::create_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Devices
        devices::add_device,
        devices::list_devices,
        devices::get_device,
        devices::update_device,
        devices::delete_device,
        // Energy data
        energy::record_energy,
        energy::list_device_readings,
        energy::list_user_readings,
        energy::correct_energy,
        // Statistics
        statistics::user_stats,
        statistics::device_stats,
        statistics::daily_stats,
        // AI
        ai::recommendations,
        ai::energy_analysis,
        ai::optimization_tips,
        ai::compare_usage,
        ai::efficiency_report,
        ai::ai_status,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::BannerResponse,
            health::HealthResponse,
            health::ComponentHealth,
            users::UserDto,
            users::UserWithDevicesDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::UserDeletedDto,
            devices::DeviceDto,
            devices::DeviceWithReadingsDto,
            devices::CreateDeviceRequest,
            devices::UpdateDeviceRequest,
            devices::DeviceDeletedDto,
            energy::EnergyDataDto,
            energy::MeasurementRequest,
            energy::CreateEnergyDataRequest,
            statistics::WindowDto,
            statistics::DailyStatsDto,
            statistics::EnergySummaryDto,
            statistics::DailyStatsReportDto,
            ai::RecommendationOutcomeDto,
            ai::RecommendationsResponse,
            ai::OptimizationTipsResponse,
            ai::MetricDeltaDto,
            ai::ComparisonPeriodDto,
            ai::ComparisonDeltasDto,
            ai::ComparisonResponse,
            ai::EnergyAnalysisResponse,
            ai::DeviceEfficiencyDto,
            ai::EfficiencyReportResponse,
            ai::AiStatusDto,
        )
    ),
    tags(
        (name = "Health", description = "Service banner and health check"),
        (name = "Users", description = "User management; deleting a user removes their devices and readings"),
        (name = "Devices", description = "Device registration and management"),
        (name = "Energy Data", description = "Energy readings: append, list, correct"),
        (name = "Statistics", description = "Aggregated consumption, production and cost"),
        (name = "AI", description = "Recommendations, usage comparison and efficiency reports with rule-based fallback"),
    ),
    info(
        title = "Energy Advisor API",
        version = "1.0.0",
        description = "Energy usage tracking, statistics and recommendations for household devices",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let energy_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/{user_id}/devices",
            get(devices::list_devices).post(devices::add_device),
        )
        .route(
            "/users/{user_id}/energy-data",
            get(energy::list_user_readings),
        )
        .route("/users/{user_id}/energy-stats", get(statistics::user_stats))
        .route("/users/{user_id}/daily-stats", get(statistics::daily_stats))
        .route(
            "/devices/{device_id}",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route(
            "/devices/{device_id}/energy-data",
            get(energy::list_device_readings).post(energy::record_energy),
        )
        .route(
            "/devices/{device_id}/energy-stats",
            get(statistics::device_stats),
        )
        .route("/energy-data/{record_id}", put(energy::correct_energy));

    let ai_routes = Router::new()
        .route(
            "/users/{user_id}/recommendations",
            post(ai::recommendations),
        )
        .route(
            "/users/{user_id}/energy-analysis",
            post(ai::energy_analysis),
        )
        .route(
            "/users/{user_id}/compare-usage",
            post(ai::compare_usage),
        )
        .route(
            "/users/{user_id}/efficiency-report",
            get(ai::efficiency_report),
        )
        .route(
            "/devices/{device_id}/optimization-tips",
            post(ai::optimization_tips),
        )
        .route("/ai-status", get(ai::ai_status));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api/v1/energy", energy_routes)
        .nest("/api/v1/ai", ai_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
