use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bill-of-materials line: raw material consumed per unit of a part.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "part_materials")]
#[schema(as = PartMaterial)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub part_number_id: i32,
    pub material_id: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub quantity: Decimal,
    pub unit: Option<String>,
    /// Expected scrap as a percentage in 0..=100.
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub scrap_percentage: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part_number::Entity",
        from = "Column::PartNumberId",
        to = "super::part_number::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    PartNumber,
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Material,
}

impl Related<super::part_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartNumber.def()
    }
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(Utc::now());
            }
            if self.scrap_percentage.is_not_set() {
                self.scrap_percentage = Set(Decimal::ZERO);
            }
        }
        Ok(self)
    }
}

impl Model {
    /// Material needed for one part including expected scrap.
    pub fn gross_quantity_per_unit(&self) -> Decimal {
        self.quantity * (Decimal::ONE_HUNDRED + self.scrap_percentage) / Decimal::ONE_HUNDRED
    }
}
