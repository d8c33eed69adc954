use crate::{
    auth::{consts as perm, AuthUser},
    common::ListParams,
    errors::ServiceError,
    services::quality::{
        CreateInspectionRequest, InspectionDetail, PendingInspection, UpdateInspectionRequest,
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
pub struct InspectionFilter {
    /// Pending, Released, Rejected or On Hold
    pub status: Option<String>,
    pub production_order_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/quality-inspections",
    summary = "List quality inspections",
    params(InspectionFilter),
    responses((status = 200, description = "Inspections, newest first", body = ApiResponse<PaginatedResponse<InspectionDetail>>)),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn list_inspections(
    State(state): State<AppState>,
    Query(filter): Query<InspectionFilter>,
) -> ApiResult<PaginatedResponse<InspectionDetail>> {
    let window = ListParams::new(filter.page, filter.limit, filter.skip).window();
    let (items, total) = state
        .services
        .quality
        .list_inspections(filter.status, filter.production_order_id, window)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/quality-inspections/{id}",
    summary = "Get quality inspection",
    params(("id" = i32, Path, description = "Inspection id")),
    responses(
        (status = 200, description = "Inspection", body = ApiResponse<InspectionDetail>),
        (status = 404, description = "Quality inspection not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn get_inspection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<InspectionDetail> {
    let inspection = state.services.quality.get_inspection(id).await?;
    Ok(Json(ApiResponse::success(inspection)))
}

/// Record an inspection; Released and Rejected results update the production order
#[utoipa::path(
    post,
    path = "/api/v1/quality-inspections",
    summary = "Create quality inspection",
    request_body = CreateInspectionRequest,
    responses(
        (status = 201, description = "Inspection recorded", body = ApiResponse<InspectionDetail>),
        (status = 400, description = "Unknown order or sheet, or quantities do not add up", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn create_inspection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateInspectionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InspectionDetail>>), ServiceError> {
    let inspection = state
        .services
        .quality
        .create_inspection(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(inspection))))
}

#[utoipa::path(
    put,
    path = "/api/v1/quality-inspections/{id}",
    summary = "Update quality inspection",
    params(("id" = i32, Path, description = "Inspection id")),
    request_body = UpdateInspectionRequest,
    responses(
        (status = 200, description = "Inspection updated", body = ApiResponse<InspectionDetail>),
        (status = 404, description = "Quality inspection not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn update_inspection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    Json(request): Json<UpdateInspectionRequest>,
) -> ApiResult<InspectionDetail> {
    let inspection = state
        .services
        .quality
        .update_inspection(id, request, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(inspection)))
}

/// Delete an inspection and reverse its effect (Admin or Management)
#[utoipa::path(
    delete,
    path = "/api/v1/quality-inspections/{id}",
    summary = "Delete quality inspection",
    params(("id" = i32, Path, description = "Inspection id")),
    responses(
        (status = 200, description = "Inspection deleted"),
        (status = 403, description = "Only Admin or Management can delete quality inspections", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quality inspection not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn delete_inspection(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<()> {
    if !auth_user.has_permission(perm::INSPECTIONS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Only Admin or Management can delete quality inspections".to_string(),
        ));
    }
    state
        .services
        .quality
        .delete_inspection(id, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::message(
        "Quality inspection deleted successfully",
    )))
}

/// Completed travel sheets of a production order still waiting for inspection
#[utoipa::path(
    get,
    path = "/api/v1/quality-inspections/production-order/{id}/pending",
    summary = "Pending inspections",
    params(("id" = i32, Path, description = "Production order id")),
    responses((status = 200, description = "Sheets awaiting inspection", body = ApiResponse<Vec<PendingInspection>>)),
    security(("Bearer" = [])),
    tag = "quality"
)]
pub async fn pending_inspections(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<PendingInspection>> {
    let pending = state.services.quality.pending_inspections(id).await?;
    Ok(Json(ApiResponse::success(pending)))
}
