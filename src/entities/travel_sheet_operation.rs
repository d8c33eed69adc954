use super::enums::OperationStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One routing step of a travel sheet, started and finished by QR scan.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "travel_sheet_operations")]
#[schema(as = TravelSheetOperation)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub travel_sheet_id: i32,
    pub process_id: i32,
    pub sequence_number: i32,
    #[sea_orm(column_type = "Text", unique)]
    pub qr_code: String,
    pub work_center_id: Option<i32>,
    #[sea_orm(indexed)]
    pub status: OperationStatus,
    #[sea_orm(indexed)]
    pub operator_id: Option<i32>,
    pub machine_id: Option<i32>,
    pub quantity_good: i32,
    pub quantity_scrap: i32,
    pub quantity_pending: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub operator_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::travel_sheet::Entity",
        from = "Column::TravelSheetId",
        to = "super::travel_sheet::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    TravelSheet,
    #[sea_orm(
        belongs_to = "super::process::Entity",
        from = "Column::ProcessId",
        to = "super::process::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Process,
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::WorkCenterId",
        to = "super::work_center::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    WorkCenter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OperatorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Operator,
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Machine,
}

impl Related<super::travel_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TravelSheet.def()
    }
}

impl Related<super::process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Process.def()
    }
}

impl Related<super::work_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkCenter.def()
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
            if self.status.is_not_set() {
                self.status = Set(OperationStatus::Pending);
            }
            if self.quantity_good.is_not_set() {
                self.quantity_good = Set(0);
            }
            if self.quantity_scrap.is_not_set() {
                self.quantity_scrap = Set(0);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

/// Whole minutes between two instants, truncated toward zero.
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    let minutes = (end - start).num_minutes();
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn elapsed_minutes_floors_partial_minutes() {
        let start = Utc::now();
        assert_eq!(elapsed_minutes(start, start + Duration::seconds(59)), 0);
        assert_eq!(elapsed_minutes(start, start + Duration::seconds(125)), 2);
    }
}
