use crate::{
    auth::AuthUser,
    common::ListParams,
    entities::role,
    errors::ServiceError,
    services::users::{UpdateProfileRequest, UpdateUserRequest, UserResponse},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};

/// List users (requires `users:read`)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    summary = "List users",
    params(ListParams),
    responses(
        (status = 200, description = "Users", body = ApiResponse<PaginatedResponse<UserResponse>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<PaginatedResponse<UserResponse>> {
    let window = params.window();
    let (items, total) = state.services.users.list_users(window).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, window,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/roles",
    summary = "List roles",
    responses((status = 200, description = "All roles", body = ApiResponse<Vec<role::Model>>)),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Vec<role::Model>> {
    let roles = state.services.users.list_roles().await?;
    Ok(Json(ApiResponse::success(roles)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    summary = "Get user",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<UserResponse> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Update any user (requires `users:update`)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    summary = "Update user",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<UserResponse>),
        (status = 400, description = "Email or badge taken", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    let user = state
        .services
        .users
        .update_user(id, request, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Update the caller's own profile
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    summary = "Update own profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserResponse>),
        (status = 400, description = "Email or badge taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<UserResponse> {
    let user = state
        .services
        .users
        .update_profile(auth_user.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Delete a user (requires `users:delete`)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    summary = "Delete user",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> ApiResult<()> {
    if id == auth_user.user_id {
        return Err(ServiceError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    state
        .services
        .users
        .delete_user(id, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
