use crate::{
    common::ListParams,
    errors::ServiceError,
    services::part_numbers::{
        AddBomLineRequest, AddSubAssemblyRequest, BomLineDetail, CreatePartNumberRequest,
        PartNumberDetail, SubAssemblyDetail, UpdatePartNumberRequest, PART_NUMBER_PAGE_SIZE,
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
pub struct PartNumberFilter {
    pub customer_id: Option<i32>,
    pub is_active: Option<bool>,
    pub page: Option<u64>,
    /// Defaults to 500
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/part-numbers",
    summary = "List part numbers",
    params(PartNumberFilter),
    responses((status = 200, description = "Part numbers with customer and routing", body = ApiResponse<PaginatedResponse<PartNumberDetail>>)),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn list_part_numbers(
    State(state): State<AppState>,
    Query(filter): Query<PartNumberFilter>,
) -> ApiResult<PaginatedResponse<PartNumberDetail>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip)
        .window_with_default(PART_NUMBER_PAGE_SIZE);
    let (items, total) = state
        .services
        .part_numbers
        .list_part_numbers(filter.customer_id, filter.is_active, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/part-numbers/{id}",
    summary = "Get part number",
    params(("id" = i32, Path, description = "Part number id")),
    responses(
        (status = 200, description = "Part number", body = ApiResponse<PartNumberDetail>),
        (status = 404, description = "Part number not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn get_part_number(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<PartNumberDetail> {
    let part = state.services.part_numbers.get_part_number(id).await?;
    Ok(Json(ApiResponse::success(part)))
}

#[utoipa::path(
    post,
    path = "/api/v1/part-numbers",
    summary = "Create part number",
    description = "Creates the part and its routing in one transaction",
    request_body = CreatePartNumberRequest,
    responses(
        (status = 201, description = "Part number created", body = ApiResponse<PartNumberDetail>),
        (status = 400, description = "Duplicate part number or unknown process", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn create_part_number(
    State(state): State<AppState>,
    Json(request): Json<CreatePartNumberRequest>,
) -> Created<PartNumberDetail> {
    let part = state.services.part_numbers.create_part_number(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(part))))
}

#[utoipa::path(
    put,
    path = "/api/v1/part-numbers/{id}",
    summary = "Update part number",
    params(("id" = i32, Path, description = "Part number id")),
    request_body = UpdatePartNumberRequest,
    responses(
        (status = 200, description = "Part number updated", body = ApiResponse<PartNumberDetail>),
        (status = 404, description = "Part number not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn update_part_number(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePartNumberRequest>,
) -> ApiResult<PartNumberDetail> {
    let part = state
        .services
        .part_numbers
        .update_part_number(id, request)
        .await?;
    Ok(Json(ApiResponse::success(part)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/part-numbers/{id}",
    summary = "Delete part number",
    params(("id" = i32, Path, description = "Part number id")),
    responses(
        (status = 200, description = "Part number deleted"),
        (status = 404, description = "Part number not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn delete_part_number(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<()> {
    state.services.part_numbers.delete_part_number(id).await?;
    Ok(Json(ApiResponse::message("Part number deleted successfully")))
}

// Bill of materials

#[utoipa::path(
    get,
    path = "/api/v1/part-numbers/{id}/materials",
    summary = "Bill of materials",
    params(("id" = i32, Path, description = "Part number id")),
    responses((status = 200, description = "Material lines", body = ApiResponse<Vec<BomLineDetail>>)),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<BomLineDetail>> {
    let lines = state.services.part_numbers.list_bom(id).await?;
    Ok(Json(ApiResponse::success(lines)))
}

#[utoipa::path(
    post,
    path = "/api/v1/part-numbers/{id}/materials",
    summary = "Add material line",
    params(("id" = i32, Path, description = "Part number id")),
    request_body = AddBomLineRequest,
    responses(
        (status = 201, description = "Line added", body = ApiResponse<BomLineDetail>),
        (status = 400, description = "Invalid quantity or scrap percentage", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn add_material(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AddBomLineRequest>,
) -> Created<BomLineDetail> {
    let line = state.services.part_numbers.add_bom_line(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(line))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/part-numbers/{id}/materials/{line_id}",
    summary = "Remove material line",
    params(
        ("id" = i32, Path, description = "Part number id"),
        ("line_id" = i32, Path, description = "Material line id"),
    ),
    responses((status = 200, description = "Line removed")),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn remove_material(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(i32, i32)>,
) -> ApiResult<()> {
    state
        .services
        .part_numbers
        .remove_bom_line(id, line_id)
        .await?;
    Ok(Json(ApiResponse::message("Material removed from part number")))
}

// Sub-assemblies

#[utoipa::path(
    get,
    path = "/api/v1/part-numbers/{id}/sub-assemblies",
    summary = "Sub-assemblies",
    params(("id" = i32, Path, description = "Part number id")),
    responses((status = 200, description = "Child parts", body = ApiResponse<Vec<SubAssemblyDetail>>)),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn list_sub_assemblies(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<SubAssemblyDetail>> {
    let links = state.services.part_numbers.list_sub_assemblies(id).await?;
    Ok(Json(ApiResponse::success(links)))
}

#[utoipa::path(
    post,
    path = "/api/v1/part-numbers/{id}/sub-assemblies",
    summary = "Add sub-assembly",
    params(("id" = i32, Path, description = "Part number id")),
    request_body = AddSubAssemblyRequest,
    responses(
        (status = 201, description = "Sub-assembly added", body = ApiResponse<SubAssemblyDetail>),
        (status = 400, description = "Part cannot contain itself, or quantity is not positive", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn add_sub_assembly(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AddSubAssemblyRequest>,
) -> Created<SubAssemblyDetail> {
    let link = state
        .services
        .part_numbers
        .add_sub_assembly(id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(link))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/part-numbers/{id}/sub-assemblies/{link_id}",
    summary = "Remove sub-assembly",
    params(
        ("id" = i32, Path, description = "Part number id"),
        ("link_id" = i32, Path, description = "Sub-assembly link id"),
    ),
    responses((status = 200, description = "Sub-assembly removed")),
    security(("Bearer" = [])),
    tag = "part-numbers"
)]
pub async fn remove_sub_assembly(
    State(state): State<AppState>,
    Path((id, link_id)): Path<(i32, i32)>,
) -> ApiResult<()> {
    state
        .services
        .part_numbers
        .remove_sub_assembly(id, link_id)
        .await?;
    Ok(Json(ApiResponse::message("Sub-assembly removed from part number")))
}
