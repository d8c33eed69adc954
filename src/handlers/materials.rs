use crate::{
    auth::AuthUser,
    common::ListParams,
    entities::{inventory_batch, inventory_movement, material, supplier},
    errors::ServiceError,
    services::inventory::{
        CreateBatchRequest, CreateMaterialRequest, CreateMovementRequest, CreateSupplierRequest,
        IssueToProductionRequest, UpdateMaterialRequest, UpdateSupplierRequest,
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

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MaterialFilter {
    /// Material type, e.g. `Steel`
    #[serde(rename = "type")]
    pub material_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchFilter {
    pub material_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    pub material_id: Option<i32>,
    pub movement_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

// Materials

#[utoipa::path(
    get,
    path = "/api/v1/materials",
    summary = "List materials",
    params(MaterialFilter),
    responses((status = 200, description = "Materials", body = ApiResponse<PaginatedResponse<material::Model>>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    Query(filter): Query<MaterialFilter>,
) -> ApiResult<PaginatedResponse<material::Model>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .inventory
        .list_materials(filter.material_type, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

/// Active materials below their minimum stock
#[utoipa::path(
    get,
    path = "/api/v1/materials/low-stock",
    summary = "Low-stock materials",
    responses((status = 200, description = "Materials below minimum stock", body = ApiResponse<Vec<material::Model>>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn low_stock(State(state): State<AppState>) -> ApiResult<Vec<material::Model>> {
    let materials = state.services.inventory.low_stock_materials().await?;
    Ok(Json(ApiResponse::success(materials)))
}

#[utoipa::path(
    get,
    path = "/api/v1/materials/{id}",
    summary = "Get material",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material", body = ApiResponse<material::Model>),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<material::Model> {
    let material = state.services.inventory.get_material(id).await?;
    Ok(Json(ApiResponse::success(material)))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials",
    summary = "Create material",
    request_body = CreateMaterialRequest,
    responses((status = 201, description = "Material created", body = ApiResponse<material::Model>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn create_material(
    State(state): State<AppState>,
    Json(request): Json<CreateMaterialRequest>,
) -> Created<material::Model> {
    let material = state.services.inventory.create_material(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(material))))
}

#[utoipa::path(
    put,
    path = "/api/v1/materials/{id}",
    summary = "Update material",
    params(("id" = i32, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = ApiResponse<material::Model>),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMaterialRequest>,
) -> ApiResult<material::Model> {
    let material = state.services.inventory.update_material(id, request).await?;
    Ok(Json(ApiResponse::success(material)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/materials/{id}",
    summary = "Delete material",
    params(("id" = i32, Path, description = "Material id")),
    responses((status = 200, description = "Material deleted")),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn delete_material(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<()> {
    state.services.inventory.delete_material(id).await?;
    Ok(Json(ApiResponse::message("Material deleted successfully")))
}

// Suppliers

#[utoipa::path(
    get,
    path = "/api/v1/materials/suppliers",
    summary = "List suppliers",
    params(ListParams),
    responses((status = 200, description = "Suppliers", body = ApiResponse<PaginatedResponse<supplier::Model>>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<supplier::Model>> {
    let window = params.window();
    let (items, total) = state.services.inventory.list_suppliers(window).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/materials/suppliers/{id}",
    summary = "Get supplier",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.inventory.get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials/suppliers",
    summary = "Create supplier",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<supplier::Model>),
        (status = 400, description = "Supplier code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Created<supplier::Model> {
    let supplier = state.services.inventory.create_supplier(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(supplier))))
}

#[utoipa::path(
    put,
    path = "/api/v1/materials/suppliers/{id}",
    summary = "Update supplier",
    params(("id" = i32, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses((status = 200, description = "Supplier updated", body = ApiResponse<supplier::Model>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSupplierRequest>,
) -> ApiResult<supplier::Model> {
    let supplier = state.services.inventory.update_supplier(id, request).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/materials/suppliers/{id}",
    summary = "Delete supplier",
    params(("id" = i32, Path, description = "Supplier id")),
    responses((status = 200, description = "Supplier deleted")),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn delete_supplier(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<()> {
    state.services.inventory.delete_supplier(id).await?;
    Ok(Json(ApiResponse::message("Supplier deleted successfully")))
}

// Batches

#[utoipa::path(
    get,
    path = "/api/v1/materials/batches",
    summary = "List inventory batches",
    params(BatchFilter),
    responses((status = 200, description = "Batches", body = ApiResponse<PaginatedResponse<inventory_batch::Model>>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(filter): Query<BatchFilter>,
) -> ApiResult<PaginatedResponse<inventory_batch::Model>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .inventory
        .list_batches(filter.material_id, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/materials/batches/{id}",
    summary = "Get inventory batch",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch", body = ApiResponse<inventory_batch::Model>),
        (status = 404, description = "Inventory batch not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<inventory_batch::Model> {
    let batch = state.services.inventory.get_batch(id).await?;
    Ok(Json(ApiResponse::success(batch)))
}

/// Receive material into a new batch; stock rises and a Receipt movement is logged
#[utoipa::path(
    post,
    path = "/api/v1/materials/batches",
    summary = "Receive inventory batch",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = ApiResponse<inventory_batch::Model>),
        (status = 400, description = "Unknown material or duplicate batch number", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateBatchRequest>,
) -> Created<inventory_batch::Model> {
    let batch = state
        .services
        .inventory
        .create_batch(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(batch))))
}

// Movements

#[utoipa::path(
    get,
    path = "/api/v1/materials/movements",
    summary = "List inventory movements",
    params(MovementFilter),
    responses((status = 200, description = "Movements, newest first", body = ApiResponse<PaginatedResponse<inventory_movement::Model>>)),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(filter): Query<MovementFilter>,
) -> ApiResult<PaginatedResponse<inventory_movement::Model>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .inventory
        .list_movements(filter.material_id, filter.movement_type, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials/movements",
    summary = "Record inventory movement",
    request_body = CreateMovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = ApiResponse<inventory_movement::Model>),
        (status = 400, description = "Invalid type or insufficient batch quantity", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateMovementRequest>,
) -> Created<inventory_movement::Model> {
    let movement = state
        .services
        .inventory
        .create_movement(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movement))))
}

#[utoipa::path(
    post,
    path = "/api/v1/materials/movements/issue-to-production",
    summary = "Issue material to a production order",
    request_body = IssueToProductionRequest,
    responses(
        (status = 201, description = "Issue recorded", body = ApiResponse<inventory_movement::Model>),
        (status = 400, description = "Unknown order, material or batch, or insufficient quantity", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "materials"
)]
pub async fn issue_to_production(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<IssueToProductionRequest>,
) -> Created<inventory_movement::Model> {
    let movement = state
        .services
        .inventory
        .issue_to_production(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movement))))
}
