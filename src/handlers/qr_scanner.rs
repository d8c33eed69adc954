use crate::{
    entities::travel_sheet_operation,
    errors::ServiceError,
    services::shop_floor::{
        CompleteOperationRequest, CompleteOperationResponse, QrScanRequest, QrScanResponse,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Scan a travel-sheet or operation QR code with an operator badge.
///
/// Always answers 200; the outcome is carried in `success` and `message`.
#[utoipa::path(
    post,
    path = "/api/v1/qr-scanner/scan",
    summary = "Scan QR code",
    request_body = QrScanRequest,
    responses((status = 200, description = "Scan outcome", body = QrScanResponse)),
    security(("Bearer" = [])),
    tag = "shop-floor"
)]
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<QrScanRequest>,
) -> Result<Json<QrScanResponse>, ServiceError> {
    let outcome = state.services.shop_floor.scan(request).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/v1/qr-scanner/operations/{id}/complete",
    summary = "Complete operation",
    params(("id" = i32, Path, description = "Operation id")),
    request_body = CompleteOperationRequest,
    responses(
        (status = 200, description = "Operation completed", body = CompleteOperationResponse),
        (status = 400, description = "Operation is not in progress", body = crate::errors::ErrorResponse),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shop-floor"
)]
pub async fn complete_operation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CompleteOperationRequest>,
) -> Result<Json<CompleteOperationResponse>, ServiceError> {
    let completed = state
        .services
        .shop_floor
        .complete_operation(id, request)
        .await?;
    Ok(Json(completed))
}

#[utoipa::path(
    get,
    path = "/api/v1/qr-scanner/operations/{id}",
    summary = "Get operation",
    params(("id" = i32, Path, description = "Operation id")),
    responses(
        (status = 200, description = "Operation", body = ApiResponse<travel_sheet_operation::Model>),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "shop-floor"
)]
pub async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<travel_sheet_operation::Model> {
    let operation = state.services.shop_floor.get_operation(id).await?;
    Ok(Json(ApiResponse::success(operation)))
}
