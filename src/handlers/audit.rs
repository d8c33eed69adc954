use crate::{common::ListParams, entities::audit_log, ApiResponse, ApiResult, AppState, PaginatedResponse};
use axum::{
    extract::{Query, State},
    Json,
};

/// Audit trail, newest first (requires `audit:read`)
#[utoipa::path(
    get,
    path = "/api/v1/audit-log",
    summary = "List audit entries",
    params(ListParams),
    responses(
        (status = 200, description = "Audit entries", body = ApiResponse<PaginatedResponse<audit_log::Model>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = [])),
    tag = "audit"
)]
pub async fn list_audit_log(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<audit_log::Model>> {
    let window = params.window();
    let (items, total) = state.services.audit.list(window).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}
