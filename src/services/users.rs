use crate::{
    auth::hash_password_blocking,
    common::{non_empty, PageWindow},
    db::DbPool,
    entities::{role, user},
    errors::ServiceError,
    services::audit::{self, AuditEntry},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// User as returned by the API: no password hash, role embedded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub badge_id: Option<String>,
    pub role_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub role: Option<role::Model>,
}

impl UserResponse {
    pub fn from_parts(user: user::Model, role: Option<role::Model>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            badge_id: user.badge_id,
            role_id: user.role_id,
            is_active: user.is_active,
            created_at: user.created_at,
            role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub badge_id: Option<String>,
    pub role_id: Option<i32>,
}

/// Admin-side update; every field optional.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    #[validate(length(max = 50))]
    pub badge_id: Option<String>,
    pub role_id: Option<i32>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub badge_id: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUserRequest {
    fn from(profile: UpdateProfileRequest) -> Self {
        Self {
            email: profile.email,
            full_name: profile.full_name,
            badge_id: profile.badge_id,
            password: profile.password,
            role_id: None,
            is_active: None,
        }
    }
}

/// Service for user accounts and roles
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        window: PageWindow,
    ) -> Result<(Vec<UserResponse>, u64), ServiceError> {
        let db = &*self.db_pool;
        let total = user::Entity::find().count(db).await?;
        let users = user::Entity::find()
            .find_also_related(role::Entity)
            .order_by_asc(user::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((
            users
                .into_iter()
                .map(|(u, r)| UserResponse::from_parts(u, r))
                .collect(),
            total,
        ))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<UserResponse, ServiceError> {
        let (found, found_role) = user::Entity::find_by_id(id)
            .find_also_related(role::Entity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        Ok(UserResponse::from_parts(found, found_role))
    }

    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<role::Model>, ServiceError> {
        Ok(role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Creates an account. Blank optional strings are stored as NULL.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        request: RegisterUserRequest,
        actor_id: i32,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let username = request.username.trim().to_string();
        let email = non_empty(request.email);
        let badge_id = non_empty(request.badge_id);

        if find_by_username(db, &username).await?.is_some() {
            return Err(ServiceError::BadRequest("Username already registered".into()));
        }
        if let Some(email) = &email {
            ensure_valid_email(email)?;
            if email_owner(db, email).await?.is_some() {
                return Err(ServiceError::BadRequest("Email already registered".into()));
            }
        }
        if let Some(badge) = &badge_id {
            if badge_owner(db, badge).await?.is_some() {
                return Err(ServiceError::BadRequest("Badge ID already registered".into()));
            }
        }
        if let Some(role_id) = request.role_id {
            ensure_role_exists(db, role_id).await?;
        }

        let password_hash = hash_password_blocking(request.password).await?;
        let created = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            full_name: Set(non_empty(request.full_name)),
            badge_id: Set(badge_id),
            role_id: Set(request.role_id),
            password_hash: Set(password_hash),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        audit::record(
            db,
            AuditEntry::new(actor_id, "CREATE", "users", created.id)
                .with_details(json!({ "username": created.username })),
        )
        .await?;
        info!(user_id = created.id, "user registered");
        self.get_user(created.id).await
    }

    /// Applies an admin update to any user. The change and its audit row commit together.
    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        id: i32,
        request: UpdateUserRequest,
        actor_id: i32,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let existing = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        if let Some(role_id) = request.role_id {
            ensure_role_exists(&txn, role_id).await?;
        }
        let changed_fields = changed_field_names(&request);
        apply_update(&txn, existing, request).await?;
        audit::record(
            &txn,
            AuditEntry::new(actor_id, "UPDATE", "users", id)
                .with_details(json!({ "fields": changed_fields })),
        )
        .await?;
        txn.commit().await?;
        self.get_user(id).await
    }

    /// Applies a self-service profile update to the caller.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: i32,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, ServiceError> {
        let request: UpdateUserRequest = request.into();
        request.validate()?;
        let db = &*self.db_pool;
        let existing = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        apply_update(db, existing, request).await?;
        self.get_user(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i32, actor_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        user::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            AuditEntry::new(actor_id, "DELETE", "users", id)
                .with_details(json!({ "username": existing.username })),
        )
        .await?;
        txn.commit().await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

async fn apply_update<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    request: UpdateUserRequest,
) -> Result<(), ServiceError> {
    let user_id = existing.id;
    let mut active: user::ActiveModel = existing.into();

    if let Some(raw) = request.email {
        let email = non_empty(Some(raw));
        if let Some(email) = &email {
            ensure_valid_email(email)?;
            if email_owner(db, email)
                .await?
                .is_some_and(|owner| owner.id != user_id)
            {
                return Err(ServiceError::BadRequest(
                    "Email already registered to another user".into(),
                ));
            }
        }
        active.email = Set(email);
    }
    if let Some(raw) = request.badge_id {
        let badge = non_empty(Some(raw));
        if let Some(badge) = &badge {
            if badge_owner(db, badge)
                .await?
                .is_some_and(|owner| owner.id != user_id)
            {
                return Err(ServiceError::BadRequest(
                    "Badge ID already registered to another user".into(),
                ));
            }
        }
        active.badge_id = Set(badge);
    }
    if let Some(raw) = request.full_name {
        active.full_name = Set(non_empty(Some(raw)));
    }
    if let Some(role_id) = request.role_id {
        active.role_id = Set(Some(role_id));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    // an empty password leaves the current one in place
    if let Some(password) = request.password.filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password_blocking(password).await?);
    }

    active.update(db).await?;
    Ok(())
}

async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, ServiceError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

async fn email_owner<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, ServiceError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// The user holding a badge, if any.
pub async fn badge_owner<C: ConnectionTrait>(
    db: &C,
    badge_id: &str,
) -> Result<Option<user::Model>, ServiceError> {
    Ok(user::Entity::find()
        .filter(user::Column::BadgeId.eq(badge_id))
        .one(db)
        .await?)
}

async fn ensure_role_exists<C: ConnectionTrait>(db: &C, role_id: i32) -> Result<(), ServiceError> {
    role::Entity::find_by_id(role_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::BadRequest("Role not found".into()))
}

fn ensure_valid_email(email: &str) -> Result<(), ServiceError> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "email: '{}' is not a valid email address",
            email
        )))
    }
}

fn changed_field_names(request: &UpdateUserRequest) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if request.email.is_some() {
        fields.push("email");
    }
    if request.full_name.is_some() {
        fields.push("full_name");
    }
    if request.badge_id.is_some() {
        fields.push("badge_id");
    }
    if request.role_id.is_some() {
        fields.push("role_id");
    }
    if request.is_active.is_some() {
        fields.push("is_active");
    }
    if request.password.as_deref().is_some_and(|p| !p.is_empty()) {
        fields.push("password");
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_lists_only_submitted_fields() {
        let request = UpdateUserRequest {
            badge_id: Some("OP-7".into()),
            password: Some(String::new()),
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(changed_field_names(&request), vec!["badge_id", "is_active"]);
    }

    #[test]
    fn profile_update_never_touches_role_or_activation() {
        let update: UpdateUserRequest = UpdateProfileRequest {
            full_name: Some("Ana Ruiz".into()),
            ..Default::default()
        }
        .into();
        assert!(update.role_id.is_none());
        assert!(update.is_active.is_none());
        assert_eq!(update.full_name.as_deref(), Some("Ana Ruiz"));
    }

    #[test]
    fn oversized_badge_fails_validation() {
        let request = UpdateUserRequest {
            badge_id: Some("B".repeat(51)),
            ..Default::default()
        };
        assert!(request.validate().is_err());
        assert!(UpdateUserRequest::default().validate().is_ok());
    }

    #[test]
    fn email_format_is_checked() {
        assert!(ensure_valid_email("qc@plant.example").is_ok());
        assert!(ensure_valid_email("not-an-email").is_err());
    }
}
