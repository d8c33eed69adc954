use crate::{
    auth::AuthUser,
    common::ListParams,
    errors::ServiceError,
    services::shipments::{ApprovedQuantity, ShipmentDetail, ShipmentRequest},
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
pub struct ShipmentFilter {
    /// Prepared, Shipped or Delivered
    pub status: Option<String>,
    pub customer_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShipmentStatusUpdate {
    pub status: String,
    pub tracking_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    summary = "List shipments",
    params(ShipmentFilter),
    responses((status = 200, description = "Shipments, newest first", body = ApiResponse<PaginatedResponse<ShipmentDetail>>)),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(filter): Query<ShipmentFilter>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<ShipmentDetail>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (shipments, total) = state
        .services
        .shipments
        .list_shipments(filter.status, filter.customer_id, window)
        .await?;
    let items = shipments
        .into_iter()
        .map(|shipment| shipment.mask_prices(auth_user.can_view_prices))
        .collect();
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/{id}",
    summary = "Get shipment",
    params(("id" = i32, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Shipment with items", body = ApiResponse<ShipmentDetail>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<ShipmentDetail> {
    let shipment = state.services.shipments.get_shipment(id).await?;
    Ok(Json(ApiResponse::success(
        shipment.mask_prices(auth_user.can_view_prices),
    )))
}

/// Create a shipment; linked production orders must pass the quality gate
#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    summary = "Create shipment",
    request_body = ShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<ShipmentDetail>),
        (status = 400, description = "Quality gate failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer, sales order, part or production order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<ShipmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShipmentDetail>>), ServiceError> {
    let shipment = state
        .services
        .shipments
        .create_shipment(request, auth_user.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            shipment.mask_prices(auth_user.can_view_prices),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/shipments/{id}",
    summary = "Update shipment",
    description = "Replaces the shipment's items; shipped quantities are reversed and re-applied",
    params(("id" = i32, Path, description = "Shipment id")),
    request_body = ShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated", body = ApiResponse<ShipmentDetail>),
        (status = 400, description = "Quality gate failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    Json(request): Json<ShipmentRequest>,
) -> ApiResult<ShipmentDetail> {
    let shipment = state
        .services
        .shipments
        .update_shipment(id, request, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(
        shipment.mask_prices(auth_user.can_view_prices),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/shipments/{id}",
    summary = "Delete shipment",
    params(("id" = i32, Path, description = "Shipment id")),
    responses(
        (status = 204, description = "Shipment deleted"),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .shipments
        .delete_shipment(id, auth_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/shipments/{id}/status",
    summary = "Update shipment status",
    params(("id" = i32, Path, description = "Shipment id"), ShipmentStatusUpdate),
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ShipmentDetail>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn update_shipment_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(update): Query<ShipmentStatusUpdate>,
    auth_user: AuthUser,
) -> ApiResult<ShipmentDetail> {
    let shipment = state
        .services
        .shipments
        .update_status(id, &update.status, update.tracking_number)
        .await?;
    Ok(Json(ApiResponse::success(
        shipment.mask_prices(auth_user.can_view_prices),
    )))
}

/// Per sales-order line: ordered, shipped, quality-approved and still shippable quantities
#[utoipa::path(
    get,
    path = "/api/v1/shipments/sales-order/{id}/approved-quantities",
    summary = "Approved quantities for a sales order",
    params(("id" = i32, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Quantities per line", body = ApiResponse<Vec<ApprovedQuantity>>),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shipments"
)]
pub async fn approved_quantities(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<ApprovedQuantity>> {
    let quantities = state.services.shipments.approved_quantities(id).await?;
    Ok(Json(ApiResponse::success(quantities)))
}
