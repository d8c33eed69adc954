use crate::{
    common::PageWindow,
    db::DbPool,
    entities::{
        enums::MovementType, inventory_batch, inventory_movement, material, production_order,
        supplier,
    },
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

const MOVEMENT_TYPES: &str = "Receipt, Issue, Return, Adjustment";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "type")]
    pub material_type: Option<String>,
    pub unit: Option<String>,
    pub minimum_stock: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub material_type: Option<String>,
    pub unit: Option<String>,
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

/// Material receipt into a new batch
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub batch_number: String,
    pub material_id: i32,
    pub supplier_id: Option<i32>,
    pub heat_number: Option<String>,
    pub lot_number: Option<String>,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub received_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateMovementRequest {
    /// Receipt, Issue, Return or Adjustment
    pub movement_type: String,
    pub batch_id: Option<i32>,
    pub material_id: i32,
    pub quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueToProductionRequest {
    pub production_order_id: i32,
    pub material_id: i32,
    pub batch_id: i32,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

/// Service for materials, suppliers, inventory batches and stock movements
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    // ---- materials ----

    #[instrument(skip(self))]
    pub async fn list_materials(
        &self,
        material_type: Option<String>,
        window: PageWindow,
    ) -> Result<(Vec<material::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = material::Entity::find();
        if let Some(kind) = material_type.filter(|k| !k.is_empty()) {
            query = query.filter(material::Column::MaterialType.eq(kind));
        }
        let total = query.clone().count(db).await?;
        let materials = query
            .order_by_asc(material::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((materials, total))
    }

    #[instrument(skip(self))]
    pub async fn get_material(&self, id: i32) -> Result<material::Model, ServiceError> {
        material::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn create_material(
        &self,
        request: CreateMaterialRequest,
    ) -> Result<material::Model, ServiceError> {
        request.validate()?;
        let created = material::ActiveModel {
            name: Set(request.name),
            material_type: Set(request.material_type),
            unit: Set(request.unit),
            minimum_stock: Set(request.minimum_stock),
            current_stock: Set(Decimal::ZERO),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(material_id = created.id, "material created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_material(
        &self,
        id: i32,
        request: UpdateMaterialRequest,
    ) -> Result<material::Model, ServiceError> {
        request.validate()?;
        let mut active: material::ActiveModel = self.get_material(id).await?.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(kind) = request.material_type {
            active.material_type = Set(Some(kind));
        }
        if let Some(unit) = request.unit {
            active.unit = Set(Some(unit));
        }
        if let Some(minimum) = request.minimum_stock {
            active.minimum_stock = Set(Some(minimum));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_material(&self, id: i32) -> Result<(), ServiceError> {
        let result = material::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Material not found".to_string()));
        }
        Ok(())
    }

    /// Active materials whose stock has fallen below their configured minimum.
    #[instrument(skip(self))]
    pub async fn low_stock_materials(&self) -> Result<Vec<material::Model>, ServiceError> {
        let materials = material::Entity::find()
            .filter(material::Column::IsActive.eq(true))
            .filter(material::Column::MinimumStock.is_not_null())
            .order_by_asc(material::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(materials
            .into_iter()
            .filter(material::Model::is_below_minimum)
            .collect())
    }

    // ---- suppliers ----

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        window: PageWindow,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let total = supplier::Entity::find().count(db).await?;
        let suppliers = supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((suppliers, total))
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: i32) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let exists = supplier::Entity::find()
            .filter(supplier::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(ServiceError::BadRequest(
                "Supplier code already exists".to_string(),
            ));
        }
        Ok(supplier::ActiveModel {
            code: Set(request.code),
            name: Set(request.name),
            address: Set(request.address),
            contact_person: Set(request.contact_person),
            phone: Set(request.phone),
            email: Set(request.email),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_supplier(
        &self,
        id: i32,
        request: UpdateSupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let mut active: supplier::ActiveModel = self.get_supplier(id).await?.into();
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
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: i32) -> Result<(), ServiceError> {
        let result = supplier::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Supplier not found".to_string()));
        }
        Ok(())
    }

    // ---- batches ----

    #[instrument(skip(self))]
    pub async fn list_batches(
        &self,
        material_id: Option<i32>,
        window: PageWindow,
    ) -> Result<(Vec<inventory_batch::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = inventory_batch::Entity::find();
        if let Some(material_id) = material_id {
            query = query.filter(inventory_batch::Column::MaterialId.eq(material_id));
        }
        let total = query.clone().count(db).await?;
        let batches = query
            .order_by_asc(inventory_batch::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((batches, total))
    }

    #[instrument(skip(self))]
    pub async fn get_batch(&self, id: i32) -> Result<inventory_batch::Model, ServiceError> {
        inventory_batch::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Inventory batch not found".to_string()))
    }

    /// Receives material: creates the batch, raises stock and records a Receipt movement.
    #[instrument(skip(self, request), fields(batch = %request.batch_number))]
    pub async fn create_batch(
        &self,
        request: CreateBatchRequest,
        user_id: i32,
    ) -> Result<inventory_batch::Model, ServiceError> {
        request.validate()?;
        ensure_positive(request.quantity)?;
        let txn = self.db_pool.begin().await?;

        let material = find_material(&txn, request.material_id).await?;
        let duplicate = inventory_batch::Entity::find()
            .filter(inventory_batch::Column::BatchNumber.eq(request.batch_number.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if duplicate {
            return Err(ServiceError::BadRequest(
                "Batch number already exists".to_string(),
            ));
        }

        let batch = inventory_batch::ActiveModel {
            batch_number: Set(request.batch_number.clone()),
            material_id: Set(request.material_id),
            supplier_id: Set(request.supplier_id),
            heat_number: Set(request.heat_number),
            lot_number: Set(request.lot_number),
            quantity: Set(request.quantity),
            remaining_quantity: Set(request.quantity),
            unit: Set(request.unit),
            received_date: Set(request.received_date),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        adjust_material_stock(&txn, material, request.quantity).await?;

        inventory_movement::ActiveModel {
            movement_type: Set(MovementType::Receipt),
            batch_id: Set(Some(batch.id)),
            material_id: Set(request.material_id),
            quantity: Set(request.quantity),
            reference_type: Set(Some("InventoryBatch".to_string())),
            reference_id: Set(Some(batch.id)),
            notes: Set(Some(format!(
                "Material receipt - Batch {}",
                request.batch_number
            ))),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(batch_id = batch.id, quantity = %batch.quantity, "material received");
        Ok(batch)
    }

    // ---- movements ----

    /// Lists movements newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        material_id: Option<i32>,
        movement_type: Option<String>,
        window: PageWindow,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = inventory_movement::Entity::find();
        if let Some(material_id) = material_id {
            query = query.filter(inventory_movement::Column::MaterialId.eq(material_id));
        }
        if let Some(raw) = movement_type.filter(|t| !t.is_empty()) {
            let kind = parse_movement_type(&raw)?;
            query = query.filter(inventory_movement::Column::MovementType.eq(kind));
        }
        let total = query.clone().count(db).await?;
        let movements = query
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .order_by_desc(inventory_movement::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;
        Ok((movements, total))
    }

    /// Records a movement and applies it to material stock and batch remaining quantity.
    #[instrument(skip(self, request), fields(kind = %request.movement_type))]
    pub async fn create_movement(
        &self,
        request: CreateMovementRequest,
        user_id: i32,
    ) -> Result<inventory_movement::Model, ServiceError> {
        let kind = parse_movement_type(&request.movement_type)?;
        if kind == MovementType::Adjustment {
            ensure_nonzero(request.quantity)?;
        } else {
            ensure_positive(request.quantity)?;
        }
        let delta = signed_quantity(kind, request.quantity);
        let txn = self.db_pool.begin().await?;

        let material = find_material(&txn, request.material_id).await?;
        let batch = match request.batch_id {
            Some(batch_id) => {
                let batch = find_batch(&txn, batch_id).await?;
                if delta < Decimal::ZERO {
                    ensure_available(&batch, -delta)?;
                }
                Some(batch)
            }
            None => None,
        };
        // Downward corrections may not push stock negative.
        if kind == MovementType::Adjustment && material.current_stock + delta < Decimal::ZERO {
            return Err(ServiceError::BadRequest(format!(
                "Insufficient material stock. Available: {}",
                material.current_stock
            )));
        }

        let movement = inventory_movement::ActiveModel {
            movement_type: Set(kind),
            batch_id: Set(request.batch_id),
            material_id: Set(request.material_id),
            quantity: Set(request.quantity),
            reference_type: Set(request.reference_type),
            reference_id: Set(request.reference_id),
            notes: Set(request.notes),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        adjust_material_stock(&txn, material, delta).await?;
        if let Some(batch) = batch {
            adjust_batch_remaining(&txn, batch, delta).await?;
        }

        txn.commit().await?;
        info!(movement_id = movement.id, "inventory movement recorded");
        Ok(movement)
    }

    /// Issues batch material against a production order for traceability.
    #[instrument(skip(self, request))]
    pub async fn issue_to_production(
        &self,
        request: IssueToProductionRequest,
        user_id: i32,
    ) -> Result<inventory_movement::Model, ServiceError> {
        ensure_positive(request.quantity)?;
        let txn = self.db_pool.begin().await?;

        let order = production_order::Entity::find_by_id(request.production_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Production order not found".to_string()))?;
        let material = find_material(&txn, request.material_id).await?;
        let batch = find_batch(&txn, request.batch_id).await?;
        if batch.remaining_quantity < request.quantity {
            warn!(batch_id = batch.id, "issue exceeds batch remaining quantity");
            return Err(ServiceError::BadRequest(format!(
                "Insufficient quantity in batch. Available: {}, Requested: {}",
                batch.remaining_quantity, request.quantity
            )));
        }

        let movement = inventory_movement::ActiveModel {
            movement_type: Set(MovementType::Issue),
            batch_id: Set(Some(batch.id)),
            material_id: Set(material.id),
            quantity: Set(request.quantity),
            reference_type: Set(Some("ProductionOrder".to_string())),
            reference_id: Set(Some(order.id)),
            notes: Set(Some(request.notes.unwrap_or_else(|| {
                format!("Material issued to PO {}", order.po_number)
            }))),
            created_by: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        adjust_material_stock(&txn, material, -request.quantity).await?;
        adjust_batch_remaining(&txn, batch, -request.quantity).await?;

        txn.commit().await?;
        info!(
            movement_id = movement.id,
            production_order = %order.po_number,
            "material issued to production"
        );
        Ok(movement)
    }
}

pub fn parse_movement_type(raw: &str) -> Result<MovementType, ServiceError> {
    MovementType::from_str(raw.trim()).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid movement type. Must be one of: {}",
            MOVEMENT_TYPES
        ))
    })
}

/// Stock delta a movement applies: issues subtract, everything else adds.
/// Adjustments carry their own sign.
pub fn signed_quantity(kind: MovementType, quantity: Decimal) -> Decimal {
    if kind.is_outbound() {
        -quantity
    } else {
        quantity
    }
}

fn ensure_positive(quantity: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::BadRequest(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn ensure_nonzero(quantity: Decimal) -> Result<(), ServiceError> {
    if quantity.is_zero() {
        return Err(ServiceError::BadRequest(
            "Adjustment quantity must not be zero".to_string(),
        ));
    }
    Ok(())
}

fn ensure_available(batch: &inventory_batch::Model, quantity: Decimal) -> Result<(), ServiceError> {
    if batch.remaining_quantity < quantity {
        return Err(ServiceError::BadRequest(format!(
            "Insufficient quantity in batch. Available: {}",
            batch.remaining_quantity
        )));
    }
    Ok(())
}

async fn find_material(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<material::Model, ServiceError> {
    material::Entity::find_by_id(id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("Material not found".to_string()))
}

async fn find_batch(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<inventory_batch::Model, ServiceError> {
    inventory_batch::Entity::find_by_id(id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("Batch not found".to_string()))
}

async fn adjust_material_stock<C: ConnectionTrait>(
    db: &C,
    material: material::Model,
    delta: Decimal,
) -> Result<(), ServiceError> {
    let stock = material.current_stock + delta;
    let mut active: material::ActiveModel = material.into();
    active.current_stock = Set(stock);
    active.update(db).await?;
    Ok(())
}

async fn adjust_batch_remaining<C: ConnectionTrait>(
    db: &C,
    batch: inventory_batch::Model,
    delta: Decimal,
) -> Result<(), ServiceError> {
    let remaining = batch.remaining_quantity + delta;
    let mut active: inventory_batch::ActiveModel = batch.into();
    active.remaining_quantity = Set(remaining);
    active.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(MovementType::Receipt, dec!(5), dec!(5))]
    #[case(MovementType::Return, dec!(2.5), dec!(2.5))]
    #[case(MovementType::Adjustment, dec!(1), dec!(1))]
    #[case(MovementType::Adjustment, dec!(-3), dec!(-3))]
    #[case(MovementType::Issue, dec!(4), dec!(-4))]
    fn movement_direction(#[case] kind: MovementType, #[case] qty: Decimal, #[case] expected: Decimal) {
        assert_eq!(signed_quantity(kind, qty), expected);
    }

    #[test]
    fn unknown_movement_type_lists_choices() {
        let err = parse_movement_type("Transfer").unwrap_err();
        assert_eq!(
            err.response_message(),
            "Invalid movement type. Must be one of: Receipt, Issue, Return, Adjustment"
        );
        assert_eq!(parse_movement_type("Issue").unwrap(), MovementType::Issue);
    }

    #[test]
    fn insufficient_batch_message_reports_available() {
        let batch = inventory_batch::Model {
            id: 1,
            batch_number: "B-1".into(),
            material_id: 1,
            supplier_id: None,
            heat_number: None,
            lot_number: None,
            quantity: dec!(10.00),
            remaining_quantity: dec!(3.50),
            unit: Some("kg".into()),
            received_date: None,
            created_by: None,
            created_at: Utc::now(),
        };
        assert!(ensure_available(&batch, dec!(3.5)).is_ok());
        let err = ensure_available(&batch, dec!(4)).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "Insufficient quantity in batch. Available: 3.50");
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(ensure_positive(Decimal::ZERO).is_err());
        assert!(ensure_positive(dec!(0.01)).is_ok());
        assert!(ensure_positive(dec!(-1)).is_err());
        assert!(ensure_nonzero(Decimal::ZERO).is_err());
        assert!(ensure_nonzero(dec!(-1)).is_ok());
    }
}
