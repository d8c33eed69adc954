use crate::{
    auth::{AuthError, AuthUser, TokenResponse},
    errors::ServiceError,
    services::users::{RegisterUserRequest, UserResponse},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use metrics::counter;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

/// Username/password pair accepted by the login endpoint
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login credentials from either a JSON body or an OAuth2-style form post.
pub struct LoginCredentials(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(body) = Json::<LoginRequest>::from_request(request, state)
                .await
                .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<LoginRequest>::from_request(request, state)
                .await
                .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        }
    }
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Log in",
    description = "Accepts `application/x-www-form-urlencoded` or JSON credentials",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Inactive user"),
        (status = 401, description = "Incorrect username or password"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    LoginCredentials(credentials): LoginCredentials,
) -> Result<Json<TokenResponse>, AuthError> {
    match state
        .auth
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(token) => {
            info!(username = %credentials.username, "user logged in");
            Ok(Json(token))
        }
        Err(err) => {
            counter!("shopfloor_auth.login_failures", 1);
            Err(err)
        }
    }
}

/// The signed-in user with their role
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    summary = "Current user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<UserResponse> {
    let user = state.services.users.get_user(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Create a user account (requires `users:create`)
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    summary = "Register user",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Username, email or badge already registered", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    let user = state
        .services
        .users
        .register(request, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}
