use super::enums::InspectionStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "quality_inspections")]
#[schema(as = QualityInspection)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub travel_sheet_id: Option<i32>,
    #[sea_orm(indexed)]
    pub production_order_id: i32,
    pub inspector_id: Option<i32>,
    pub inspection_date: DateTime<Utc>,
    pub status: InspectionStatus,
    pub quantity_inspected: Option<i32>,
    pub quantity_approved: Option<i32>,
    pub quantity_rejected: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_order::Entity",
        from = "Column::ProductionOrderId",
        to = "super::production_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ProductionOrder,
    #[sea_orm(
        belongs_to = "super::travel_sheet::Entity",
        from = "Column::TravelSheetId",
        to = "super::travel_sheet::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    TravelSheet,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InspectorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Inspector,
}

impl Related<super::production_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrder.def()
    }
}

impl Related<super::travel_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelSheet.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if insert {
            let now = Utc::now();
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.inspection_date.is_not_set() {
                self.inspection_date = Set(now);
            }
        }
        Ok(self)
    }
}

impl Model {
    pub fn approved(&self) -> i32 {
        self.quantity_approved.unwrap_or(0)
    }

    pub fn rejected(&self) -> i32 {
        self.quantity_rejected.unwrap_or(0)
    }
}
