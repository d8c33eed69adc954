use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One step of a part's routing.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "part_routings")]
#[schema(as = PartRouting)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub part_number_id: i32,
    pub process_id: i32,
    pub sequence_number: i32,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub standard_time_minutes: Option<Decimal>,
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
        belongs_to = "super::process::Entity",
        from = "Column::ProcessId",
        to = "super::process::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Process,
}

impl Related<super::part_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartNumber.def()
    }
}

impl Related<super::process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Process.def()
    }
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
