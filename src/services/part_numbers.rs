use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{customer, material, part_material, part_number, part_routing, part_sub_assembly, process},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Part numbers default to a larger page than other lists.
pub const PART_NUMBER_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RoutingInput {
    pub process_id: i32,
    pub sequence_number: i32,
    pub standard_time_minutes: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePartNumberRequest {
    #[validate(length(min = 1, max = 100))]
    pub part_number: String,
    pub customer_id: Option<i32>,
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub routings: Vec<RoutingInput>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePartNumberRequest {
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub unit_price: Option<Decimal>,
    pub is_active: Option<bool>,
    /// Replaces the whole routing when present
    pub routings: Option<Vec<RoutingInput>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddBomLineRequest {
    pub material_id: i32,
    /// Material consumed per finished part
    pub quantity: Decimal,
    pub unit: Option<String>,
    /// Expected scrap, 0 to 100
    #[serde(default)]
    pub scrap_percentage: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddSubAssemblyRequest {
    pub child_part_id: i32,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoutingDetail {
    #[serde(flatten)]
    pub routing: part_routing::Model,
    pub process: Option<process::Model>,
}

/// Part number with its customer and ordered routing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartNumberDetail {
    #[serde(flatten)]
    pub part: part_number::Model,
    pub customer: Option<customer::Model>,
    pub routings: Vec<RoutingDetail>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BomLineDetail {
    #[serde(flatten)]
    pub line: part_material::Model,
    pub material: Option<material::Model>,
    /// Quantity per part including scrap allowance
    pub gross_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubAssemblyDetail {
    #[serde(flatten)]
    pub link: part_sub_assembly::Model,
    pub child_part: Option<part_number::Model>,
}

/// Service for part numbers, their routings, bills of material and sub-assemblies
#[derive(Clone)]
pub struct PartNumberService {
    db_pool: Arc<DbPool>,
}

impl PartNumberService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_part_numbers(
        &self,
        customer_id: Option<i32>,
        is_active: Option<bool>,
        window: PageWindow,
    ) -> Result<(Vec<PartNumberDetail>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = part_number::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(part_number::Column::CustomerId.eq(customer_id));
        }
        if let Some(active) = is_active {
            query = query.filter(part_number::Column::IsActive.eq(active));
        }
        let total = query.clone().count(db).await?;
        let parts = query
            .order_by_asc(part_number::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((load_details(db, parts).await?, total))
    }

    #[instrument(skip(self))]
    pub async fn get_part_number(&self, id: i32) -> Result<PartNumberDetail, ServiceError> {
        let db = &*self.db_pool;
        let part = part_number::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part number not found".to_string()))?;
        load_details(db, vec![part])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Part number not found".to_string()))
    }

    #[instrument(skip(self, request), fields(part = %request.part_number))]
    pub async fn create_part_number(
        &self,
        request: CreatePartNumberRequest,
    ) -> Result<PartNumberDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;

        let exists = part_number::Entity::find()
            .filter(part_number::Column::PartNumber.eq(request.part_number.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Part number already exists".to_string(),
            ));
        }
        if let Some(customer_id) = request.customer_id {
            customer::Entity::find_by_id(customer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::BadRequest("Customer not found".to_string()))?;
        }

        let part = part_number::ActiveModel {
            part_number: Set(request.part_number),
            customer_id: Set(request.customer_id),
            description: Set(request.description),
            material_type: Set(request.material_type),
            unit_price: Set(request.unit_price),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        insert_routings(&txn, part.id, &request.routings).await?;

        txn.commit().await?;
        info!(part_number_id = part.id, "part number created");
        self.get_part_number(part.id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_part_number(
        &self,
        id: i32,
        request: UpdatePartNumberRequest,
    ) -> Result<PartNumberDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = part_number::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part number not found".to_string()))?;

        let mut active: part_number::ActiveModel = existing.into();
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(material_type) = request.material_type {
            active.material_type = Set(Some(material_type));
        }
        if let Some(price) = request.unit_price {
            active.unit_price = Set(Some(price));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.update(&txn).await?;

        if let Some(routings) = request.routings {
            part_routing::Entity::delete_many()
                .filter(part_routing::Column::PartNumberId.eq(id))
                .exec(&txn)
                .await?;
            insert_routings(&txn, id, &routings).await?;
        }

        txn.commit().await?;
        self.get_part_number(id).await
    }

    /// Deletes the part with its routings, BOM lines and sub-assembly links.
    #[instrument(skip(self))]
    pub async fn delete_part_number(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        part_number::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part number not found".to_string()))?;

        part_routing::Entity::delete_many()
            .filter(part_routing::Column::PartNumberId.eq(id))
            .exec(&txn)
            .await?;
        part_material::Entity::delete_many()
            .filter(part_material::Column::PartNumberId.eq(id))
            .exec(&txn)
            .await?;
        part_sub_assembly::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(part_sub_assembly::Column::ParentPartId.eq(id))
                    .add(part_sub_assembly::Column::ChildPartId.eq(id)),
            )
            .exec(&txn)
            .await?;
        part_number::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(part_number_id = id, "part number deleted");
        Ok(())
    }

    // ---- bill of materials ----

    #[instrument(skip(self))]
    pub async fn list_bom(&self, part_id: i32) -> Result<Vec<BomLineDetail>, ServiceError> {
        let db = &*self.db_pool;
        ensure_part(db, part_id, true).await?;
        let lines = part_material::Entity::find()
            .filter(part_material::Column::PartNumberId.eq(part_id))
            .find_also_related(material::Entity)
            .order_by_asc(part_material::Column::Id)
            .all(db)
            .await?;
        Ok(lines
            .into_iter()
            .map(|(line, material)| BomLineDetail {
                gross_quantity: line.gross_quantity_per_unit(),
                line,
                material,
            })
            .collect())
    }

    #[instrument(skip(self, request))]
    pub async fn add_bom_line(
        &self,
        part_id: i32,
        request: AddBomLineRequest,
    ) -> Result<BomLineDetail, ServiceError> {
        let db = &*self.db_pool;
        ensure_part(db, part_id, true).await?;
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::BadRequest(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        if request.scrap_percentage < Decimal::ZERO
            || request.scrap_percentage > Decimal::ONE_HUNDRED
        {
            return Err(ServiceError::BadRequest(
                "Scrap percentage must be between 0 and 100".to_string(),
            ));
        }
        let found_material = material::Entity::find_by_id(request.material_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Material not found".to_string()))?;

        let line = part_material::ActiveModel {
            part_number_id: Set(part_id),
            material_id: Set(request.material_id),
            quantity: Set(request.quantity),
            unit: Set(request.unit.or_else(|| found_material.unit.clone())),
            scrap_percentage: Set(request.scrap_percentage),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(BomLineDetail {
            gross_quantity: line.gross_quantity_per_unit(),
            line,
            material: Some(found_material),
        })
    }

    #[instrument(skip(self))]
    pub async fn remove_bom_line(&self, part_id: i32, line_id: i32) -> Result<(), ServiceError> {
        let result = part_material::Entity::delete_many()
            .filter(part_material::Column::Id.eq(line_id))
            .filter(part_material::Column::PartNumberId.eq(part_id))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(
                "Bill of materials line not found".to_string(),
            ));
        }
        Ok(())
    }

    // ---- sub-assemblies ----

    #[instrument(skip(self))]
    pub async fn list_sub_assemblies(
        &self,
        part_id: i32,
    ) -> Result<Vec<SubAssemblyDetail>, ServiceError> {
        let db = &*self.db_pool;
        ensure_part(db, part_id, true).await?;
        let links = part_sub_assembly::Entity::find()
            .filter(part_sub_assembly::Column::ParentPartId.eq(part_id))
            .order_by_asc(part_sub_assembly::Column::Id)
            .all(db)
            .await?;
        let child_ids: Vec<i32> = links.iter().map(|l| l.child_part_id).collect();
        let children: HashMap<i32, part_number::Model> = part_number::Entity::find()
            .filter(part_number::Column::Id.is_in(child_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(links
            .into_iter()
            .map(|link| SubAssemblyDetail {
                child_part: children.get(&link.child_part_id).cloned(),
                link,
            })
            .collect())
    }

    #[instrument(skip(self, request))]
    pub async fn add_sub_assembly(
        &self,
        part_id: i32,
        request: AddSubAssemblyRequest,
    ) -> Result<SubAssemblyDetail, ServiceError> {
        let db = &*self.db_pool;
        if request.child_part_id == part_id {
            return Err(ServiceError::BadRequest(
                "A part cannot be a sub-assembly of itself".to_string(),
            ));
        }
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::BadRequest(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        ensure_part(db, part_id, true).await?;
        let child = ensure_part(db, request.child_part_id, false).await?;

        let duplicate = part_sub_assembly::Entity::find()
            .filter(part_sub_assembly::Column::ParentPartId.eq(part_id))
            .filter(part_sub_assembly::Column::ChildPartId.eq(request.child_part_id))
            .one(db)
            .await?
            .is_some();
        if duplicate {
            return Err(ServiceError::BadRequest(
                "Sub-assembly already linked to this part".to_string(),
            ));
        }

        let link = part_sub_assembly::ActiveModel {
            parent_part_id: Set(part_id),
            child_part_id: Set(request.child_part_id),
            quantity: Set(request.quantity),
            unit: Set(request.unit),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(SubAssemblyDetail {
            link,
            child_part: Some(child),
        })
    }

    #[instrument(skip(self))]
    pub async fn remove_sub_assembly(&self, part_id: i32, link_id: i32) -> Result<(), ServiceError> {
        let result = part_sub_assembly::Entity::delete_many()
            .filter(part_sub_assembly::Column::Id.eq(link_id))
            .filter(part_sub_assembly::Column::ParentPartId.eq(part_id))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Sub-assembly not found".to_string()));
        }
        Ok(())
    }
}

/// Loads a part; a missing parent is 404, a missing referenced child is 400.
async fn ensure_part<C: ConnectionTrait>(
    db: &C,
    id: i32,
    is_parent: bool,
) -> Result<part_number::Model, ServiceError> {
    part_number::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| {
            if is_parent {
                ServiceError::NotFound("Part number not found".to_string())
            } else {
                ServiceError::BadRequest("Child part number not found".to_string())
            }
        })
}

async fn insert_routings<C: ConnectionTrait>(
    db: &C,
    part_id: i32,
    routings: &[RoutingInput],
) -> Result<(), ServiceError> {
    let mut seen = HashSet::new();
    for routing in routings {
        if !seen.insert(routing.sequence_number) {
            return Err(ServiceError::BadRequest(format!(
                "Duplicate routing sequence {}",
                routing.sequence_number
            )));
        }
        process::Entity::find_by_id(routing.process_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::BadRequest(format!("Process {} not found", routing.process_id))
            })?;
        part_routing::ActiveModel {
            part_number_id: Set(part_id),
            process_id: Set(routing.process_id),
            sequence_number: Set(routing.sequence_number),
            standard_time_minutes: Set(routing.standard_time_minutes),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Attaches customers and sequence-ordered routings to a page of parts.
pub(crate) async fn load_details<C: ConnectionTrait>(
    db: &C,
    parts: Vec<part_number::Model>,
) -> Result<Vec<PartNumberDetail>, ServiceError> {
    let part_ids: Vec<i32> = parts.iter().map(|p| p.id).collect();
    let customer_ids: Vec<i32> = parts.iter().filter_map(|p| p.customer_id).collect();

    let customers: HashMap<i32, customer::Model> = if customer_ids.is_empty() {
        HashMap::new()
    } else {
        customer::Entity::find()
            .filter(customer::Column::Id.is_in(customer_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let mut routings: HashMap<i32, Vec<RoutingDetail>> = HashMap::new();
    if !part_ids.is_empty() {
        let rows = part_routing::Entity::find()
            .filter(part_routing::Column::PartNumberId.is_in(part_ids))
            .find_also_related(process::Entity)
            .order_by_asc(part_routing::Column::PartNumberId)
            .order_by_asc(part_routing::Column::SequenceNumber)
            .all(db)
            .await?;
        for (routing, process) in rows {
            routings
                .entry(routing.part_number_id)
                .or_default()
                .push(RoutingDetail { routing, process });
        }
    }

    Ok(parts
        .into_iter()
        .map(|part| PartNumberDetail {
            customer: part.customer_id.and_then(|id| customers.get(&id).cloned()),
            routings: routings.remove(&part.id).unwrap_or_default(),
            part,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn part_cannot_contain_itself() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = PartNumberService::new(Arc::new(db));
        let err = service
            .add_sub_assembly(
                5,
                AddSubAssemblyRequest {
                    child_part_id: 5,
                    quantity: dec!(1),
                    unit: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg.contains("itself"));
    }

    #[tokio::test]
    async fn sub_assembly_quantity_must_be_positive() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = PartNumberService::new(Arc::new(db));
        let err = service
            .add_sub_assembly(
                5,
                AddSubAssemblyRequest {
                    child_part_id: 6,
                    quantity: dec!(0),
                    unit: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(_));
    }
}
