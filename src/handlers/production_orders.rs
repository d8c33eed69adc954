use crate::{
    auth::AuthUser,
    common::ListParams,
    entities::production_order,
    errors::ServiceError,
    services::production_orders::{
        CreateProductionOrderRequest, TravelSheetDetail, UpdateProductionOrderRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionOrderFilter {
    pub status: Option<String>,
    pub part_number_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/production-orders",
    summary = "List production orders",
    params(ProductionOrderFilter),
    responses(
        (status = 200, description = "Production orders", body = ApiResponse<PaginatedResponse<production_order::Model>>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn list_production_orders(
    State(state): State<AppState>,
    Query(filter): Query<ProductionOrderFilter>,
) -> ApiResult<PaginatedResponse<production_order::Model>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .production_orders
        .list_production_orders(filter.status, filter.part_number_id, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/production-orders/{id}",
    summary = "Get production order",
    params(("id" = i32, Path, description = "Production order id")),
    responses(
        (status = 200, description = "Production order", body = ApiResponse<production_order::Model>),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn get_production_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<production_order::Model> {
    let order = state
        .services
        .production_orders
        .get_production_order(id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Create a production order; the PO number is generated
#[utoipa::path(
    post,
    path = "/api/v1/production-orders",
    summary = "Create production order",
    request_body = CreateProductionOrderRequest,
    responses(
        (status = 201, description = "Production order created", body = ApiResponse<production_order::Model>),
        (status = 400, description = "Part number not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn create_production_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateProductionOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<production_order::Model>>), ServiceError> {
    let order = state
        .services
        .production_orders
        .create_production_order(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

#[utoipa::path(
    put,
    path = "/api/v1/production-orders/{id}",
    summary = "Update production order",
    params(("id" = i32, Path, description = "Production order id")),
    request_body = UpdateProductionOrderRequest,
    responses(
        (status = 200, description = "Production order updated", body = ApiResponse<production_order::Model>),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn update_production_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    Json(request): Json<UpdateProductionOrderRequest>,
) -> ApiResult<production_order::Model> {
    let order = state
        .services
        .production_orders
        .update_production_order(id, request, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Delete a production order with its travel sheets, operations and inspections
#[utoipa::path(
    delete,
    path = "/api/v1/production-orders/{id}",
    summary = "Delete production order",
    params(("id" = i32, Path, description = "Production order id")),
    responses(
        (status = 200, description = "Production order deleted"),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn delete_production_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<()> {
    state
        .services
        .production_orders
        .delete_production_order(id, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::message(
        "Production order deleted successfully",
    )))
}

/// Build a travel sheet with one operation per routing step
#[utoipa::path(
    post,
    path = "/api/v1/production-orders/{id}/generate-travel-sheet",
    summary = "Generate travel sheet",
    params(("id" = i32, Path, description = "Production order id")),
    responses(
        (status = 201, description = "Travel sheet generated", body = ApiResponse<TravelSheetDetail>),
        (status = 400, description = "No routing defined for this part number", body = crate::errors::ErrorResponse),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn generate_travel_sheet(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<TravelSheetDetail>>), ServiceError> {
    let sheet = state
        .services
        .production_orders
        .generate_travel_sheet(id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sheet))))
}

#[utoipa::path(
    get,
    path = "/api/v1/production-orders/{id}/travel-sheets",
    summary = "List travel sheets",
    params(("id" = i32, Path, description = "Production order id")),
    responses(
        (status = 200, description = "Travel sheets with operations", body = ApiResponse<Vec<TravelSheetDetail>>),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "production-orders"
)]
pub async fn list_travel_sheets(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<TravelSheetDetail>> {
    let sheets = state
        .services
        .production_orders
        .list_travel_sheets(id)
        .await?;
    Ok(Json(ApiResponse::success(sheets)))
}
