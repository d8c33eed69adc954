use crate::{
    common::ListParams,
    entities::enums::{parse_status, RiskStatus},
    services::dashboard::{
        DailyProduction, DashboardStats, ProductionDashboardFilter, ProductionDashboardItem,
        WorkCenterLoad,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

const RISK_STATUSES: &str = "Green, Yellow, Red";
const DEFAULT_DAILY_WINDOW: u32 = 7;
const MAX_DAILY_WINDOW: u32 = 366;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionDashboardQuery {
    pub status: Option<String>,
    /// Green, Yellow or Red
    pub risk_status: Option<String>,
    pub customer_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyProductionQuery {
    /// Look-back window in days (default 7)
    pub days: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    summary = "Dashboard counters",
    responses((status = 200, description = "Order and schedule counters", body = ApiResponse<DashboardStats>)),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.services.dashboard.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/production",
    summary = "Production progress",
    params(ProductionDashboardQuery),
    responses(
        (status = 200, description = "One row per production order", body = ApiResponse<Vec<ProductionDashboardItem>>),
        (status = 400, description = "Invalid status or risk status", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn production(
    State(state): State<AppState>,
    Query(query): Query<ProductionDashboardQuery>,
) -> ApiResult<Vec<ProductionDashboardItem>> {
    let window = ListParams::new(query.page, query.limit, query.skip).window();
    let risk_status = query
        .risk_status
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_status::<RiskStatus>(&raw, RISK_STATUSES))
        .transpose()?;
    let filter = ProductionDashboardFilter {
        status: query.status,
        risk_status,
        customer_id: query.customer_id,
    };
    let rows = state.services.dashboard.production(filter, window).await?;
    Ok(Json(ApiResponse::success(rows)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/work-center-load",
    summary = "Work center load",
    responses((status = 200, description = "Operations per work center by status", body = ApiResponse<Vec<WorkCenterLoad>>)),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn work_center_load(State(state): State<AppState>) -> ApiResult<Vec<WorkCenterLoad>> {
    let load = state.services.dashboard.work_center_load().await?;
    Ok(Json(ApiResponse::success(load)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/daily-production",
    summary = "Daily production",
    params(DailyProductionQuery),
    responses((status = 200, description = "Good and scrap units per day", body = ApiResponse<Vec<DailyProduction>>)),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn daily_production(
    State(state): State<AppState>,
    Query(query): Query<DailyProductionQuery>,
) -> ApiResult<Vec<DailyProduction>> {
    let days = query
        .days
        .unwrap_or(DEFAULT_DAILY_WINDOW)
        .clamp(1, MAX_DAILY_WINDOW);
    let rows = state.services.dashboard.daily_production(days).await?;
    Ok(Json(ApiResponse::success(rows)))
}
