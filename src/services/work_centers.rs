use crate::{
    db::DbPool,
    entities::{machine, process, work_center},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkCenterRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkCenterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub work_center_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub work_center_id: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProcessRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub work_center_id: i32,
}

/// Service for the plant layout: work centers, their machines and the processes run there
#[derive(Clone)]
pub struct WorkCenterService {
    db_pool: Arc<DbPool>,
}

impl WorkCenterService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_work_centers(&self) -> Result<Vec<work_center::Model>, ServiceError> {
        Ok(work_center::Entity::find()
            .order_by_asc(work_center::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_work_center(&self, id: i32) -> Result<work_center::Model, ServiceError> {
        work_center::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Work center not found".to_string()))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_work_center(
        &self,
        request: CreateWorkCenterRequest,
    ) -> Result<work_center::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let exists = work_center::Entity::find()
            .filter(work_center::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Work center code already exists".to_string(),
            ));
        }
        let created = work_center::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!(work_center_id = created.id, "work center created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_work_center(
        &self,
        id: i32,
        request: UpdateWorkCenterRequest,
    ) -> Result<work_center::Model, ServiceError> {
        request.validate()?;
        let mut active: work_center::ActiveModel = self.get_work_center(id).await?.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_machines(
        &self,
        work_center_id: Option<i32>,
    ) -> Result<Vec<machine::Model>, ServiceError> {
        let mut query = machine::Entity::find();
        if let Some(work_center_id) = work_center_id {
            query = query.filter(machine::Column::WorkCenterId.eq(work_center_id));
        }
        Ok(query
            .order_by_asc(machine::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_machine(
        &self,
        request: CreateMachineRequest,
    ) -> Result<machine::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        ensure_work_center(db, request.work_center_id).await?;
        let exists = machine::Entity::find()
            .filter(machine::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Machine code already exists".to_string(),
            ));
        }
        Ok(machine::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            work_center_id: Set(Some(request.work_center_id)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_machine(
        &self,
        id: i32,
        request: UpdateMachineRequest,
    ) -> Result<machine::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let existing = machine::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Machine not found".to_string()))?;
        let mut active: machine::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(work_center_id) = request.work_center_id {
            ensure_work_center(db, work_center_id).await?;
            active.work_center_id = Set(Some(work_center_id));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_processes(&self) -> Result<Vec<process::Model>, ServiceError> {
        Ok(process::Entity::find()
            .order_by_asc(process::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_process(
        &self,
        request: CreateProcessRequest,
    ) -> Result<process::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        ensure_work_center(db, request.work_center_id).await?;
        let exists = process::Entity::find()
            .filter(process::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Process code already exists".to_string(),
            ));
        }
        Ok(process::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            work_center_id: Set(Some(request.work_center_id)),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }
}

async fn ensure_work_center<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), ServiceError> {
    work_center::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::BadRequest("Work center not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn machine_requires_existing_work_center() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<work_center::Model>::new()])
            .into_connection();
        let service = WorkCenterService::new(Arc::new(db));
        let err = service
            .create_machine(CreateMachineRequest {
                code: "LSR-02".into(),
                name: "Fiber laser".into(),
                work_center_id: 99,
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "Work center not found");
    }

    #[tokio::test]
    async fn blank_code_fails_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = WorkCenterService::new(Arc::new(db));
        let err = service
            .create_work_center(CreateWorkCenterRequest {
                code: String::new(),
                name: "Assembly".into(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }
}
