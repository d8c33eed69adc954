/*!
 * # Authentication and Authorization Module
 *
 * Bearer-token authentication for the shop-floor API:
 *
 * - JWT (HS256) access tokens issued at login
 * - Argon2 password hashing
 * - Role-based access control (RBAC): roles live in the database, their
 *   permission catalog is static (see [`rbac`])
 *
 * The auth middleware reloads the user on every request, so deactivating a
 * user or changing their role takes effect immediately.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{role, user};

mod password;
mod permissions;
pub mod rbac;

pub use password::*;
pub use permissions::*;
pub use rbac::{check_permission, permissions_for_role, ADMIN_ROLE, MANAGEMENT_ROLE};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User id
    pub role: Option<String>,
    pub can_view_prices: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user resolved from the bearer token and the users table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Option<String>,
    pub can_view_prices: bool,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Check if the user has a specific permission (admins have all of them)
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin()
            || self
                .permissions
                .iter()
                .any(|granted| check_permission(granted, permission))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration: std::time::Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, access_token_expiration: std::time::Duration) -> Self {
        Self {
            jwt_secret,
            access_token_expiration,
        }
    }

    pub fn from_app_config(cfg: &crate::config::AppConfig) -> Self {
        let secs = u64::try_from(cfg.jwt_expiration_secs()).unwrap_or(86_400);
        Self::new(
            cfg.jwt_secret.clone(),
            std::time::Duration::from_secs(secs),
        )
    }
}

/// Bearer token returned by login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Generate a JWT for a user
    pub fn generate_token(
        &self,
        user: &user::Model,
        role: Option<&role::Model>,
    ) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            role: role.map(|r| r.name.clone()),
            can_view_prices: role.map(|r| r.can_view_prices).unwrap_or(false),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Checks a username/password pair and issues a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .find_also_related(role::Entity)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let (account, account_role) = match found {
            Some(pair) => pair,
            None => {
                debug!(%username, "login for unknown user");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let candidate = password.to_string();
        let stored = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        if !verified {
            warn!(%username, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }
        if !account.is_active {
            return Err(AuthError::InactiveUser);
        }

        self.generate_token(&account, account_role.as_ref())
    }

    /// Resolves a bearer token to the current state of its user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;

        let (account, account_role) = user::Entity::find()
            .filter(user::Column::Username.eq(claims.sub.as_str()))
            .find_also_related(role::Entity)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !account.is_active {
            return Err(AuthError::InactiveUser);
        }

        let role_name = account_role.as_ref().map(|r| r.name.clone());
        Ok(AuthUser {
            user_id: account.id,
            username: account.username,
            permissions: permissions_for_role(role_name.as_deref()),
            can_view_prices: account_role.map(|r| r.can_view_prices).unwrap_or(false),
            role: role_name,
            token_id: claims.jti,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Could not validate credentials")]
    UserNotFound,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuth
            | Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNotFound => StatusCode::UNAUTHORIZED,
            Self::InactiveUser | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingAuth => "AUTH_MISSING",
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::InvalidToken => "AUTH_INVALID_TOKEN",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::TokenCreation(_) => "AUTH_TOKEN_CREATION_FAILED",
            Self::UserNotFound => "AUTH_USER_NOT_FOUND",
            Self::InactiveUser => "AUTH_INACTIVE_USER",
            Self::InsufficientPermissions => "AUTH_INSUFFICIENT_PERMISSIONS",
            Self::InvalidRequest(_) => "AUTH_INVALID_REQUEST",
            Self::DatabaseError(_) => "AUTH_DATABASE_ERROR",
            Self::InternalError(_) => "AUTH_INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingAuth => "Not authenticated".to_string(),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "authentication failed internally");
        }

        let body = Json(serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Handlers receive the user placed in the request extensions by [`auth_middleware`].
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Permission middleware to check if a user has the required permission
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_permission(&required_permission) {
        debug!(
            user = %user.username,
            permission = %required_permission,
            "permission denied"
        );
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that validates the bearer token and loads the user
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_string(),
        None => return AuthError::MissingAuth.into_response(),
    };

    match auth_service.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> AuthService {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection();
        AuthService::new(
            AuthConfig::new(
                "Q7v!shopfloor-test-signing-key-9xZk2Lm".to_string(),
                std::time::Duration::from_secs(3600),
            ),
            Arc::new(db),
        )
    }

    fn sample_user() -> user::Model {
        user::Model {
            id: 7,
            username: "quality.lead".into(),
            email: None,
            password_hash: String::new(),
            role_id: Some(3),
            badge_id: Some("QC007".into()),
            full_name: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let svc = service();
        let role = role::Model {
            id: 3,
            name: "Quality".into(),
            can_view_prices: false,
            description: None,
            created_at: Utc::now(),
        };
        let token = svc.generate_token(&sample_user(), Some(&role)).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);

        let claims = svc.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, "quality.lead");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.role.as_deref(), Some("Quality"));
        assert!(!claims.can_view_prices);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = service();
        let other = AuthService {
            config: AuthConfig::new(
                "another-secret-that-is-long-enough-0000".into(),
                std::time::Duration::from_secs(60),
            ),
            db: svc.db.clone(),
        };
        let token = other.generate_token(&sample_user(), None).unwrap();
        assert!(matches!(
            svc.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn admin_has_every_permission() {
        let admin = AuthUser {
            user_id: 1,
            username: "admin".into(),
            role: Some(ADMIN_ROLE.into()),
            can_view_prices: true,
            permissions: vec![],
            token_id: "t".into(),
        };
        assert!(admin.has_permission(consts::USERS_DELETE));

        let operator = AuthUser {
            role: Some("Operator".into()),
            permissions: permissions_for_role(Some("Operator")),
            ..admin
        };
        assert!(!operator.has_permission(consts::USERS_READ));
    }

    #[test]
    fn auth_error_statuses() {
        assert_eq!(AuthError::InactiveUser.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Incorrect username or password"
        );
    }
}
