use crate::{
    common::PageWindow,
    db::DbPool,
    entities::customer,
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_frequency: Option<String>,
}

/// Partial update; the customer code cannot change.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_frequency: Option<String>,
    pub is_active: Option<bool>,
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        is_active: Option<bool>,
        window: PageWindow,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = customer::Entity::find();
        if let Some(active) = is_active {
            query = query.filter(customer::Column::IsActive.eq(active));
        }
        let total = query.clone().count(db).await?;
        let customers = query
            .order_by_asc(customer::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((customers, total))
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let exists = customer::Entity::find()
            .filter(customer::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Customer code already exists".to_string(),
            ));
        }

        let created = customer::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            address: Set(request.address),
            contact_person: Set(request.contact_person),
            phone: Set(request.phone),
            email: Set(request.email),
            delivery_frequency: Set(request.delivery_frequency),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!(customer_id = created.id, "customer created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: i32,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_customer(id).await?;
        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(contact) = request.contact_person {
            active.contact_person = Set(Some(contact));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(frequency) = request.delivery_frequency {
            active.delivery_frequency = Set(Some(frequency));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: i32) -> Result<(), ServiceError> {
        let result = customer::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Customer not found".to_string()));
        }
        info!(customer_id = id, "customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn acme() -> customer::Model {
        customer::Model {
            id: 1,
            code: "ACME".into(),
            name: "Acme Metals".into(),
            address: None,
            contact_person: None,
            phone: None,
            email: None,
            delivery_frequency: Some("Weekly".into()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![acme()]])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));

        let err = service
            .create_customer(CreateCustomerRequest {
                code: "ACME".into(),
                name: "Another".into(),
                address: None,
                contact_person: None,
                phone: None,
                email: None,
                delivery_frequency: None,
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "Customer code already exists");
    }

    #[tokio::test]
    async fn deleting_missing_customer_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));
        assert_matches!(
            service.delete_customer(42).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn get_customer_returns_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![acme()]])
            .into_connection();
        let service = CustomerService::new(Arc::new(db));
        let found = service.get_customer(1).await.unwrap();
        assert_eq!(found.code, "ACME");
    }
}
