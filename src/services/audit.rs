use crate::{
    common::PageWindow,
    db::DbPool,
    entities::audit_log,
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One row to append to the audit trail
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: &'static str,
    pub table_name: &'static str,
    pub record_id: Option<i32>,
    pub details: Option<Value>,
}

impl AuditEntry {
    pub fn new(user_id: i32, action: &'static str, table_name: &'static str, record_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            table_name,
            record_id: Some(record_id),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Appends an entry on the given connection so it commits with the change it describes.
pub async fn record<C: ConnectionTrait>(db: &C, entry: AuditEntry) -> Result<(), ServiceError> {
    debug!(
        action = entry.action,
        table = entry.table_name,
        record_id = ?entry.record_id,
        "audit"
    );
    audit_log::ActiveModel {
        user_id: Set(entry.user_id),
        action: Set(entry.action.to_string()),
        table_name: Set(Some(entry.table_name.to_string())),
        record_id: Set(entry.record_id),
        details: Set(entry.details),
        ip_address: Set(crate::tracing::current_client_ip()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Read access to the audit trail
#[derive(Clone)]
pub struct AuditService {
    db_pool: Arc<DbPool>,
}

impl AuditService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists entries newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, window: PageWindow) -> Result<(Vec<audit_log::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let total = audit_log::Entity::find().count(db).await?;
        let entries = audit_log::Entity::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((entries, total))
    }
}
