use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Parent/child link between two part numbers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "part_sub_assemblies")]
#[schema(as = PartSubAssembly)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_part_id: i32,
    pub child_part_id: i32,
    /// Child units per unit of parent.
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub quantity: Decimal,
    pub unit: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part_number::Entity",
        from = "Column::ParentPartId",
        to = "super::part_number::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ParentPart,
    #[sea_orm(
        belongs_to = "super::part_number::Entity",
        from = "Column::ChildPartId",
        to = "super::part_number::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ChildPart,
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(Utc::now());
        }
        Ok(self)
    }
}
