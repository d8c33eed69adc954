use super::enums::SalesOrderItemStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "sales_order_items")]
#[schema(as = SalesOrderItem)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sales_order_id: i32,
    pub part_number_id: i32,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub unit_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub total_price: Option<Decimal>,
    pub quantity_produced: i32,
    pub quantity_shipped: i32,
    pub status: SalesOrderItemStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    SalesOrder,
    #[sea_orm(
        belongs_to = "super::part_number::Entity",
        from = "Column::PartNumberId",
        to = "super::part_number::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    PartNumber,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrder.def()
    }
}

impl Related<super::part_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartNumber.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(Utc::now());
            }
            if self.quantity_produced.is_not_set() {
                self.quantity_produced = Set(0);
            }
            if self.quantity_shipped.is_not_set() {
                self.quantity_shipped = Set(0);
            }
            if self.status.is_not_set() {
                self.status = Set(SalesOrderItemStatus::Pending);
            }
        }
        Ok(self)
    }
}

impl Model {
    /// Units still owed to the customer, never negative.
    pub fn remaining_to_ship(&self) -> i32 {
        (self.quantity - self.quantity_shipped).max(0)
    }
}
