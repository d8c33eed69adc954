use super::enums::ProductionOrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The `production_orders` table: a shop order to make a quantity of one part.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "production_orders")]
#[schema(as = ProductionOrder)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique, indexed)]
    pub po_number: String,
    pub sales_order_id: Option<i32>,
    pub sales_order_item_id: Option<i32>,
    #[sea_orm(indexed)]
    pub part_number_id: i32,
    pub quantity: i32,
    pub quantity_completed: i32,
    pub quantity_scrapped: i32,
    #[sea_orm(indexed)]
    pub status: ProductionOrderStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part_number::Entity",
        from = "Column::PartNumberId",
        to = "super::part_number::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    PartNumber,
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_order::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    SalesOrder,
    #[sea_orm(has_many = "super::travel_sheet::Entity")]
    TravelSheets,
}

impl Related<super::part_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartNumber.def()
    }
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrder.def()
    }
}

impl Related<super::travel_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelSheets.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let now = Utc::now();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.quantity_completed.is_not_set() {
                self.quantity_completed = Set(0);
            }
            if self.quantity_scrapped.is_not_set() {
                self.quantity_scrapped = Set(0);
            }
            if self.status.is_not_set() {
                self.status = Set(ProductionOrderStatus::Created);
            }
            if self.priority.is_not_set() {
                self.priority = Set("Normal".to_string());
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
