use crate::{
    entities::{machine, process, work_center},
    errors::ServiceError,
    services::work_centers::{
        CreateMachineRequest, CreateProcessRequest, CreateWorkCenterRequest,
        UpdateMachineRequest, UpdateWorkCenterRequest,
    },
    ApiResponse, ApiResult, AppState,
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
pub struct MachineFilter {
    pub work_center_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers",
    summary = "List work centers",
    responses((status = 200, description = "Work centers", body = ApiResponse<Vec<work_center::Model>>)),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn list_work_centers(State(state): State<AppState>) -> ApiResult<Vec<work_center::Model>> {
    let centers = state.services.work_centers.list_work_centers().await?;
    Ok(Json(ApiResponse::success(centers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers/{id}",
    summary = "Get work center",
    params(("id" = i32, Path, description = "Work center id")),
    responses(
        (status = 200, description = "Work center", body = ApiResponse<work_center::Model>),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn get_work_center(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<work_center::Model> {
    let center = state.services.work_centers.get_work_center(id).await?;
    Ok(Json(ApiResponse::success(center)))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-centers",
    summary = "Create work center",
    request_body = CreateWorkCenterRequest,
    responses(
        (status = 201, description = "Work center created", body = ApiResponse<work_center::Model>),
        (status = 400, description = "Work center code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn create_work_center(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkCenterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<work_center::Model>>), ServiceError> {
    let center = state.services.work_centers.create_work_center(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(center))))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-centers/{id}",
    summary = "Update work center",
    params(("id" = i32, Path, description = "Work center id")),
    request_body = UpdateWorkCenterRequest,
    responses((status = 200, description = "Work center updated", body = ApiResponse<work_center::Model>)),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn update_work_center(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateWorkCenterRequest>,
) -> ApiResult<work_center::Model> {
    let center = state
        .services
        .work_centers
        .update_work_center(id, request)
        .await?;
    Ok(Json(ApiResponse::success(center)))
}

#[utoipa::path(
    get,
    path = "/api/v1/machines",
    summary = "List machines",
    params(MachineFilter),
    responses((status = 200, description = "Machines", body = ApiResponse<Vec<machine::Model>>)),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn list_machines(
    State(state): State<AppState>,
    Query(filter): Query<MachineFilter>,
) -> ApiResult<Vec<machine::Model>> {
    let machines = state
        .services
        .work_centers
        .list_machines(filter.work_center_id)
        .await?;
    Ok(Json(ApiResponse::success(machines)))
}

#[utoipa::path(
    post,
    path = "/api/v1/machines",
    summary = "Create machine",
    request_body = CreateMachineRequest,
    responses(
        (status = 201, description = "Machine created", body = ApiResponse<machine::Model>),
        (status = 400, description = "Unknown work center", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn create_machine(
    State(state): State<AppState>,
    Json(request): Json<CreateMachineRequest>,
) -> Result<(StatusCode, Json<ApiResponse<machine::Model>>), ServiceError> {
    let machine = state.services.work_centers.create_machine(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(machine))))
}

#[utoipa::path(
    put,
    path = "/api/v1/machines/{id}",
    summary = "Update machine",
    params(("id" = i32, Path, description = "Machine id")),
    request_body = UpdateMachineRequest,
    responses((status = 200, description = "Machine updated", body = ApiResponse<machine::Model>)),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn update_machine(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMachineRequest>,
) -> ApiResult<machine::Model> {
    let machine = state.services.work_centers.update_machine(id, request).await?;
    Ok(Json(ApiResponse::success(machine)))
}

#[utoipa::path(
    get,
    path = "/api/v1/processes",
    summary = "List processes",
    responses((status = 200, description = "All processes ordered by id", body = ApiResponse<Vec<process::Model>>)),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn list_processes(State(state): State<AppState>) -> ApiResult<Vec<process::Model>> {
    let processes = state.services.work_centers.list_processes().await?;
    Ok(Json(ApiResponse::success(processes)))
}

#[utoipa::path(
    post,
    path = "/api/v1/processes",
    summary = "Create process",
    request_body = CreateProcessRequest,
    responses(
        (status = 201, description = "Process created", body = ApiResponse<process::Model>),
        (status = 400, description = "Duplicate code or unknown work center", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plant"
)]
pub async fn create_process(
    State(state): State<AppState>,
    Json(request): Json<CreateProcessRequest>,
) -> Result<(StatusCode, Json<ApiResponse<process::Model>>), ServiceError> {
    let process = state.services.work_centers.create_process(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(process))))
}
