use crate::{
    auth::AuthUser,
    common::ListParams,
    errors::ServiceError,
    services::sales_orders::{CreateSalesOrderRequest, SalesOrderDetail, UpdateSalesOrderRequest},
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
pub struct SalesOrderFilter {
    pub customer_id: Option<i32>,
    /// Open, Partial, Completed or Cancelled
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

/// List sales orders; prices are blanked for roles without price visibility
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders",
    summary = "List sales orders",
    params(SalesOrderFilter),
    responses(
        (status = 200, description = "Sales orders", body = ApiResponse<PaginatedResponse<SalesOrderDetail>>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(filter): Query<SalesOrderFilter>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<SalesOrderDetail>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (orders, total) = state
        .services
        .sales_orders
        .list_sales_orders(filter.customer_id, filter.status, window)
        .await?;
    let items = orders
        .into_iter()
        .map(|order| order.mask_prices(auth_user.can_view_prices))
        .collect();
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}",
    summary = "Get sales order",
    params(("id" = i32, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Sales order", body = ApiResponse<SalesOrderDetail>),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<SalesOrderDetail> {
    let order = state.services.sales_orders.get_sales_order(id).await?;
    Ok(Json(ApiResponse::success(
        order.mask_prices(auth_user.can_view_prices),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales-orders",
    summary = "Create sales order",
    request_body = CreateSalesOrderRequest,
    responses(
        (status = 201, description = "Sales order created", body = ApiResponse<SalesOrderDetail>),
        (status = 400, description = "Duplicate PO number, unknown customer or part", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn create_sales_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateSalesOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SalesOrderDetail>>), ServiceError> {
    let order = state
        .services
        .sales_orders
        .create_sales_order(request, auth_user.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            order.mask_prices(auth_user.can_view_prices),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/sales-orders/{id}",
    summary = "Update sales order",
    description = "Partial update; an `items` array replaces every line",
    params(("id" = i32, Path, description = "Sales order id")),
    request_body = UpdateSalesOrderRequest,
    responses(
        (status = 200, description = "Sales order updated", body = ApiResponse<SalesOrderDetail>),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn update_sales_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    Json(request): Json<UpdateSalesOrderRequest>,
) -> ApiResult<SalesOrderDetail> {
    let order = state
        .services
        .sales_orders
        .update_sales_order(id, request, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(
        order.mask_prices(auth_user.can_view_prices),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sales-orders/{id}",
    summary = "Delete sales order",
    params(("id" = i32, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Sales order deleted"),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales-orders"
)]
pub async fn delete_sales_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<()> {
    state
        .services
        .sales_orders
        .delete_sales_order(id, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::message("Sales order deleted successfully")))
}
