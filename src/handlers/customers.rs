use crate::{
    common::ListParams,
    entities::customer,
    services::customers::{CreateCustomerRequest, UpdateCustomerRequest},
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
pub struct CustomerFilter {
    pub is_active: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    params(CustomerFilter),
    responses((status = 200, description = "Customers", body = ApiResponse<PaginatedResponse<customer::Model>>)),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .customers
        .list_customers(filter.is_active, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    summary = "Get customer",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Create customer",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Customer code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<customer::Model>>), crate::errors::ServiceError> {
    let customer = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    summary = "Update customer",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCustomerRequest>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.update_customer(id, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    summary = "Delete customer",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn delete_customer(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<()> {
    state.services.customers.delete_customer(id).await?;
    Ok(Json(ApiResponse::message("Customer deleted successfully")))
}
