use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_access_tables::Migration),
            Box::new(m20240101_000002_create_master_data_tables::Migration),
            Box::new(m20240101_000003_create_part_number_tables::Migration),
            Box::new(m20240101_000004_create_sales_order_tables::Migration),
            Box::new(m20240101_000005_create_production_tables::Migration),
            Box::new(m20240101_000006_create_inventory_tables::Migration),
            Box::new(m20240101_000007_create_shipment_tables::Migration),
            Box::new(m20240101_000008_add_performance_indexes::Migration),
        ]
    }
}

// Table and column identifiers shared by every migration below.

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    CanViewPrices,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    RoleId,
    BadgeId,
    FullName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    UserId,
    Action,
    TableName,
    RecordId,
    Details,
    IpAddress,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    Code,
    Name,
    Address,
    ContactPerson,
    Phone,
    Email,
    DeliveryFrequency,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Suppliers {
    Table,
    Id,
    Code,
    Name,
    Address,
    ContactPerson,
    Phone,
    Email,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Materials {
    Table,
    Id,
    Name,
    Type,
    Unit,
    CurrentStock,
    MinimumStock,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WorkCenters {
    Table,
    Id,
    Code,
    Name,
    Description,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Machines {
    Table,
    Id,
    Code,
    Name,
    WorkCenterId,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Processes {
    Table,
    Id,
    Code,
    Name,
    Description,
    WorkCenterId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PartNumbers {
    Table,
    Id,
    PartNumber,
    CustomerId,
    Description,
    MaterialType,
    UnitPrice,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PartRoutings {
    Table,
    Id,
    PartNumberId,
    ProcessId,
    SequenceNumber,
    StandardTimeMinutes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PartMaterials {
    Table,
    Id,
    PartNumberId,
    MaterialId,
    Quantity,
    Unit,
    ScrapPercentage,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PartSubAssemblies {
    Table,
    Id,
    ParentPartId,
    ChildPartId,
    Quantity,
    Unit,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SalesOrders {
    Table,
    Id,
    PoNumber,
    CustomerId,
    OrderDate,
    DueDate,
    Status,
    Notes,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SalesOrderItems {
    Table,
    Id,
    SalesOrderId,
    PartNumberId,
    Quantity,
    UnitPrice,
    TotalPrice,
    QuantityProduced,
    QuantityShipped,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProductionOrders {
    Table,
    Id,
    PoNumber,
    SalesOrderId,
    SalesOrderItemId,
    PartNumberId,
    Quantity,
    QuantityCompleted,
    QuantityScrapped,
    Status,
    StartDate,
    DueDate,
    Priority,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TravelSheets {
    Table,
    Id,
    TravelSheetNumber,
    ProductionOrderId,
    QrCode,
    BatchNumber,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TravelSheetOperations {
    Table,
    Id,
    TravelSheetId,
    ProcessId,
    SequenceNumber,
    QrCode,
    WorkCenterId,
    Status,
    OperatorId,
    MachineId,
    QuantityGood,
    QuantityScrap,
    QuantityPending,
    StartTime,
    EndTime,
    DurationMinutes,
    OperatorNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum QualityInspections {
    Table,
    Id,
    TravelSheetId,
    ProductionOrderId,
    InspectorId,
    InspectionDate,
    Status,
    QuantityInspected,
    QuantityApproved,
    QuantityRejected,
    RejectionReason,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InventoryBatches {
    Table,
    Id,
    BatchNumber,
    MaterialId,
    SupplierId,
    HeatNumber,
    LotNumber,
    Quantity,
    RemainingQuantity,
    Unit,
    ReceivedDate,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InventoryMovements {
    Table,
    Id,
    MovementType,
    BatchId,
    MaterialId,
    Quantity,
    ReferenceType,
    ReferenceId,
    Notes,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Shipments {
    Table,
    Id,
    ShipmentNumber,
    CustomerId,
    SalesOrderId,
    ShipmentDate,
    Status,
    TrackingNumber,
    Notes,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ShipmentItems {
    Table,
    Id,
    ShipmentId,
    SalesOrderItemId,
    PartNumberId,
    ProductionOrderId,
    Quantity,
    UnitPrice,
    CreatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_at_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn fk(
    name: &str,
    from: (impl IntoIden + 'static, impl IntoIden),
    to: (impl IntoIden + 'static, impl IntoIden),
    on_delete: ForeignKeyAction,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(on_delete)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

mod m20240101_000001_create_access_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_access_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Roles::Table)
                        .if_not_exists()
                        .col(id_col(Roles::Id))
                        .col(ColumnDef::new(Roles::Name).string_len(50).not_null().unique_key())
                        .col(
                            ColumnDef::new(Roles::CanViewPrices)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Roles::Description).text().null())
                        .col(created_at_col(Roles::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(id_col(Users::Id))
                        .col(ColumnDef::new(Users::Username).string_len(100).not_null().unique_key())
                        .col(ColumnDef::new(Users::Email).string_len(255).null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                        .col(ColumnDef::new(Users::RoleId).integer().null())
                        .col(ColumnDef::new(Users::BadgeId).string_len(50).null().unique_key())
                        .col(ColumnDef::new(Users::FullName).string_len(255).null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(Users::CreatedAt))
                        .col(created_at_col(Users::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_users_role_id",
                            (Users::Table, Users::RoleId),
                            (Roles::Table, Roles::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AuditLog::Table)
                        .if_not_exists()
                        .col(id_col(AuditLog::Id))
                        .col(ColumnDef::new(AuditLog::UserId).integer().null())
                        .col(ColumnDef::new(AuditLog::Action).string_len(100).not_null())
                        .col(ColumnDef::new(AuditLog::TableName).string_len(100).null())
                        .col(ColumnDef::new(AuditLog::RecordId).integer().null())
                        .col(ColumnDef::new(AuditLog::Details).json().null())
                        .col(ColumnDef::new(AuditLog::IpAddress).string_len(50).null())
                        .col(created_at_col(AuditLog::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_audit_log_user_id",
                            (AuditLog::Table, AuditLog::UserId),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLog::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Roles::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_master_data_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_master_data_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(id_col(Customers::Id))
                        .col(ColumnDef::new(Customers::Code).string_len(50).not_null().unique_key())
                        .col(ColumnDef::new(Customers::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Customers::Address).text().null())
                        .col(ColumnDef::new(Customers::ContactPerson).string_len(255).null())
                        .col(ColumnDef::new(Customers::Phone).string_len(50).null())
                        .col(ColumnDef::new(Customers::Email).string_len(255).null())
                        .col(ColumnDef::new(Customers::DeliveryFrequency).string_len(50).null())
                        .col(
                            ColumnDef::new(Customers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(Customers::CreatedAt))
                        .col(created_at_col(Customers::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(id_col(Suppliers::Id))
                        .col(ColumnDef::new(Suppliers::Code).string_len(50).not_null().unique_key())
                        .col(ColumnDef::new(Suppliers::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Suppliers::Address).text().null())
                        .col(ColumnDef::new(Suppliers::ContactPerson).string_len(255).null())
                        .col(ColumnDef::new(Suppliers::Phone).string_len(50).null())
                        .col(ColumnDef::new(Suppliers::Email).string_len(255).null())
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(Suppliers::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Materials::Table)
                        .if_not_exists()
                        .col(id_col(Materials::Id))
                        .col(ColumnDef::new(Materials::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Materials::Type).string_len(100).null())
                        .col(ColumnDef::new(Materials::Unit).string_len(20).null())
                        .col(
                            ColumnDef::new(Materials::CurrentStock)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Materials::MinimumStock).decimal_len(10, 2).null())
                        .col(
                            ColumnDef::new(Materials::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(Materials::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkCenters::Table)
                        .if_not_exists()
                        .col(id_col(WorkCenters::Id))
                        .col(ColumnDef::new(WorkCenters::Code).string_len(50).not_null().unique_key())
                        .col(ColumnDef::new(WorkCenters::Name).string_len(255).not_null())
                        .col(ColumnDef::new(WorkCenters::Description).text().null())
                        .col(
                            ColumnDef::new(WorkCenters::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(WorkCenters::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Machines::Table)
                        .if_not_exists()
                        .col(id_col(Machines::Id))
                        .col(ColumnDef::new(Machines::Code).string_len(50).not_null().unique_key())
                        .col(ColumnDef::new(Machines::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Machines::WorkCenterId).integer().null())
                        .col(
                            ColumnDef::new(Machines::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(Machines::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_machines_work_center_id",
                            (Machines::Table, Machines::WorkCenterId),
                            (WorkCenters::Table, WorkCenters::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Processes::Table)
                        .if_not_exists()
                        .col(id_col(Processes::Id))
                        .col(ColumnDef::new(Processes::Code).string_len(50).not_null().unique_key())
                        .col(ColumnDef::new(Processes::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Processes::Description).text().null())
                        .col(ColumnDef::new(Processes::WorkCenterId).integer().null())
                        .col(created_at_col(Processes::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_processes_work_center_id",
                            (Processes::Table, Processes::WorkCenterId),
                            (WorkCenters::Table, WorkCenters::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Processes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Machines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkCenters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Materials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_part_number_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_part_number_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PartNumbers::Table)
                        .if_not_exists()
                        .col(id_col(PartNumbers::Id))
                        .col(
                            ColumnDef::new(PartNumbers::PartNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PartNumbers::CustomerId).integer().null())
                        .col(ColumnDef::new(PartNumbers::Description).text().null())
                        .col(ColumnDef::new(PartNumbers::MaterialType).string_len(100).null())
                        .col(ColumnDef::new(PartNumbers::UnitPrice).decimal_len(10, 2).null())
                        .col(
                            ColumnDef::new(PartNumbers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(created_at_col(PartNumbers::CreatedAt))
                        .col(created_at_col(PartNumbers::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_part_numbers_customer_id",
                            (PartNumbers::Table, PartNumbers::CustomerId),
                            (Customers::Table, Customers::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartRoutings::Table)
                        .if_not_exists()
                        .col(id_col(PartRoutings::Id))
                        .col(ColumnDef::new(PartRoutings::PartNumberId).integer().not_null())
                        .col(ColumnDef::new(PartRoutings::ProcessId).integer().not_null())
                        .col(ColumnDef::new(PartRoutings::SequenceNumber).integer().not_null())
                        .col(
                            ColumnDef::new(PartRoutings::StandardTimeMinutes)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(created_at_col(PartRoutings::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_part_routings_part_number_id",
                            (PartRoutings::Table, PartRoutings::PartNumberId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_part_routings_process_id",
                            (PartRoutings::Table, PartRoutings::ProcessId),
                            (Processes::Table, Processes::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartMaterials::Table)
                        .if_not_exists()
                        .col(id_col(PartMaterials::Id))
                        .col(ColumnDef::new(PartMaterials::PartNumberId).integer().not_null())
                        .col(ColumnDef::new(PartMaterials::MaterialId).integer().not_null())
                        .col(
                            ColumnDef::new(PartMaterials::Quantity)
                                .decimal_len(10, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PartMaterials::Unit).string_len(20).null())
                        .col(
                            ColumnDef::new(PartMaterials::ScrapPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PartMaterials::Notes).text().null())
                        .col(created_at_col(PartMaterials::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_part_materials_part_number_id",
                            (PartMaterials::Table, PartMaterials::PartNumberId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_part_materials_material_id",
                            (PartMaterials::Table, PartMaterials::MaterialId),
                            (Materials::Table, Materials::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartSubAssemblies::Table)
                        .if_not_exists()
                        .col(id_col(PartSubAssemblies::Id))
                        .col(
                            ColumnDef::new(PartSubAssemblies::ParentPartId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartSubAssemblies::ChildPartId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartSubAssemblies::Quantity)
                                .decimal_len(10, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PartSubAssemblies::Unit).string_len(20).null())
                        .col(ColumnDef::new(PartSubAssemblies::Notes).text().null())
                        .col(created_at_col(PartSubAssemblies::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_part_sub_assemblies_parent_part_id",
                            (PartSubAssemblies::Table, PartSubAssemblies::ParentPartId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_part_sub_assemblies_child_part_id",
                            (PartSubAssemblies::Table, PartSubAssemblies::ChildPartId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PartSubAssemblies::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartRoutings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartNumbers::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_sales_order_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_sales_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(id_col(SalesOrders::Id))
                        .col(
                            ColumnDef::new(SalesOrders::PoNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::CustomerId).integer().not_null())
                        .col(ColumnDef::new(SalesOrders::OrderDate).date().not_null())
                        .col(ColumnDef::new(SalesOrders::DueDate).date().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::Status)
                                .string_len(20)
                                .not_null()
                                .default("Open"),
                        )
                        .col(ColumnDef::new(SalesOrders::Notes).text().null())
                        .col(ColumnDef::new(SalesOrders::CreatedBy).integer().null())
                        .col(created_at_col(SalesOrders::CreatedAt))
                        .col(created_at_col(SalesOrders::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_sales_orders_customer_id",
                            (SalesOrders::Table, SalesOrders::CustomerId),
                            (Customers::Table, Customers::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_sales_orders_created_by",
                            (SalesOrders::Table, SalesOrders::CreatedBy),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderItems::Table)
                        .if_not_exists()
                        .col(id_col(SalesOrderItems::Id))
                        .col(ColumnDef::new(SalesOrderItems::SalesOrderId).integer().not_null())
                        .col(ColumnDef::new(SalesOrderItems::PartNumberId).integer().not_null())
                        .col(ColumnDef::new(SalesOrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(SalesOrderItems::UnitPrice).decimal_len(10, 2).null())
                        .col(ColumnDef::new(SalesOrderItems::TotalPrice).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(SalesOrderItems::QuantityProduced)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::QuantityShipped)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(created_at_col(SalesOrderItems::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_sales_order_items_sales_order_id",
                            (SalesOrderItems::Table, SalesOrderItems::SalesOrderId),
                            (SalesOrders::Table, SalesOrders::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_sales_order_items_part_number_id",
                            (SalesOrderItems::Table, SalesOrderItems::PartNumberId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000005_create_production_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_production_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrders::Table)
                        .if_not_exists()
                        .col(id_col(ProductionOrders::Id))
                        .col(
                            ColumnDef::new(ProductionOrders::PoNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ProductionOrders::SalesOrderId).integer().null())
                        .col(ColumnDef::new(ProductionOrders::SalesOrderItemId).integer().null())
                        .col(ColumnDef::new(ProductionOrders::PartNumberId).integer().not_null())
                        .col(ColumnDef::new(ProductionOrders::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ProductionOrders::QuantityCompleted)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::QuantityScrapped)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::Status)
                                .string_len(20)
                                .not_null()
                                .default("Created"),
                        )
                        .col(ColumnDef::new(ProductionOrders::StartDate).date().null())
                        .col(ColumnDef::new(ProductionOrders::DueDate).date().null())
                        .col(
                            ColumnDef::new(ProductionOrders::Priority)
                                .string_len(20)
                                .not_null()
                                .default("Normal"),
                        )
                        .col(ColumnDef::new(ProductionOrders::CreatedBy).integer().null())
                        .col(created_at_col(ProductionOrders::CreatedAt))
                        .col(created_at_col(ProductionOrders::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_production_orders_part_number_id",
                            (ProductionOrders::Table, ProductionOrders::PartNumberId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_production_orders_sales_order_id",
                            (ProductionOrders::Table, ProductionOrders::SalesOrderId),
                            (SalesOrders::Table, SalesOrders::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_production_orders_sales_order_item_id",
                            (ProductionOrders::Table, ProductionOrders::SalesOrderItemId),
                            (SalesOrderItems::Table, SalesOrderItems::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_production_orders_created_by",
                            (ProductionOrders::Table, ProductionOrders::CreatedBy),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TravelSheets::Table)
                        .if_not_exists()
                        .col(id_col(TravelSheets::Id))
                        .col(
                            ColumnDef::new(TravelSheets::TravelSheetNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(TravelSheets::ProductionOrderId).integer().not_null())
                        .col(ColumnDef::new(TravelSheets::QrCode).text().not_null().unique_key())
                        .col(ColumnDef::new(TravelSheets::BatchNumber).string_len(100).null())
                        .col(
                            ColumnDef::new(TravelSheets::Status)
                                .string_len(20)
                                .not_null()
                                .default("Active"),
                        )
                        .col(created_at_col(TravelSheets::CreatedAt))
                        .col(created_at_col(TravelSheets::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_travel_sheets_production_order_id",
                            (TravelSheets::Table, TravelSheets::ProductionOrderId),
                            (ProductionOrders::Table, ProductionOrders::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TravelSheetOperations::Table)
                        .if_not_exists()
                        .col(id_col(TravelSheetOperations::Id))
                        .col(
                            ColumnDef::new(TravelSheetOperations::TravelSheetId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::ProcessId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::SequenceNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::QrCode)
                                .text()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(TravelSheetOperations::WorkCenterId).integer().null())
                        .col(
                            ColumnDef::new(TravelSheetOperations::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(ColumnDef::new(TravelSheetOperations::OperatorId).integer().null())
                        .col(ColumnDef::new(TravelSheetOperations::MachineId).integer().null())
                        .col(
                            ColumnDef::new(TravelSheetOperations::QuantityGood)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::QuantityScrap)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::QuantityPending)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::StartTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::EndTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TravelSheetOperations::DurationMinutes)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(TravelSheetOperations::OperatorNotes).text().null())
                        .col(created_at_col(TravelSheetOperations::CreatedAt))
                        .col(created_at_col(TravelSheetOperations::UpdatedAt))
                        .foreign_key(&mut fk(
                            "fk_travel_sheet_operations_travel_sheet_id",
                            (TravelSheetOperations::Table, TravelSheetOperations::TravelSheetId),
                            (TravelSheets::Table, TravelSheets::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_travel_sheet_operations_process_id",
                            (TravelSheetOperations::Table, TravelSheetOperations::ProcessId),
                            (Processes::Table, Processes::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_travel_sheet_operations_work_center_id",
                            (TravelSheetOperations::Table, TravelSheetOperations::WorkCenterId),
                            (WorkCenters::Table, WorkCenters::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_travel_sheet_operations_operator_id",
                            (TravelSheetOperations::Table, TravelSheetOperations::OperatorId),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_travel_sheet_operations_machine_id",
                            (TravelSheetOperations::Table, TravelSheetOperations::MachineId),
                            (Machines::Table, Machines::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QualityInspections::Table)
                        .if_not_exists()
                        .col(id_col(QualityInspections::Id))
                        .col(ColumnDef::new(QualityInspections::TravelSheetId).integer().null())
                        .col(
                            ColumnDef::new(QualityInspections::ProductionOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QualityInspections::InspectorId).integer().null())
                        .col(created_at_col(QualityInspections::InspectionDate))
                        .col(
                            ColumnDef::new(QualityInspections::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(QualityInspections::QuantityInspected).integer().null())
                        .col(ColumnDef::new(QualityInspections::QuantityApproved).integer().null())
                        .col(ColumnDef::new(QualityInspections::QuantityRejected).integer().null())
                        .col(ColumnDef::new(QualityInspections::RejectionReason).text().null())
                        .col(ColumnDef::new(QualityInspections::Notes).text().null())
                        .col(created_at_col(QualityInspections::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_quality_inspections_production_order_id",
                            (QualityInspections::Table, QualityInspections::ProductionOrderId),
                            (ProductionOrders::Table, ProductionOrders::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_quality_inspections_travel_sheet_id",
                            (QualityInspections::Table, QualityInspections::TravelSheetId),
                            (TravelSheets::Table, TravelSheets::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_quality_inspections_inspector_id",
                            (QualityInspections::Table, QualityInspections::InspectorId),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QualityInspections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TravelSheetOperations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TravelSheets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000006_create_inventory_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryBatches::Table)
                        .if_not_exists()
                        .col(id_col(InventoryBatches::Id))
                        .col(
                            ColumnDef::new(InventoryBatches::BatchNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(InventoryBatches::MaterialId).integer().not_null())
                        .col(ColumnDef::new(InventoryBatches::SupplierId).integer().null())
                        .col(ColumnDef::new(InventoryBatches::HeatNumber).string_len(100).null())
                        .col(ColumnDef::new(InventoryBatches::LotNumber).string_len(100).null())
                        .col(
                            ColumnDef::new(InventoryBatches::Quantity)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBatches::RemainingQuantity)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryBatches::Unit).string_len(20).null())
                        .col(ColumnDef::new(InventoryBatches::ReceivedDate).date().null())
                        .col(ColumnDef::new(InventoryBatches::CreatedBy).integer().null())
                        .col(created_at_col(InventoryBatches::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_inventory_batches_material_id",
                            (InventoryBatches::Table, InventoryBatches::MaterialId),
                            (Materials::Table, Materials::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_inventory_batches_supplier_id",
                            (InventoryBatches::Table, InventoryBatches::SupplierId),
                            (Suppliers::Table, Suppliers::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_inventory_batches_created_by",
                            (InventoryBatches::Table, InventoryBatches::CreatedBy),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(id_col(InventoryMovements::Id))
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::BatchId).integer().null())
                        .col(ColumnDef::new(InventoryMovements::MaterialId).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ReferenceType)
                                .string_len(50)
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::ReferenceId).integer().null())
                        .col(ColumnDef::new(InventoryMovements::Notes).text().null())
                        .col(ColumnDef::new(InventoryMovements::CreatedBy).integer().null())
                        .col(created_at_col(InventoryMovements::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_inventory_movements_material_id",
                            (InventoryMovements::Table, InventoryMovements::MaterialId),
                            (Materials::Table, Materials::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_inventory_movements_batch_id",
                            (InventoryMovements::Table, InventoryMovements::BatchId),
                            (InventoryBatches::Table, InventoryBatches::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_inventory_movements_created_by",
                            (InventoryMovements::Table, InventoryMovements::CreatedBy),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryBatches::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000007_create_shipment_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_shipment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(id_col(Shipments::Id))
                        .col(
                            ColumnDef::new(Shipments::ShipmentNumber)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Shipments::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Shipments::SalesOrderId).integer().null())
                        .col(ColumnDef::new(Shipments::ShipmentDate).date().not_null())
                        .col(
                            ColumnDef::new(Shipments::Status)
                                .string_len(20)
                                .not_null()
                                .default("Prepared"),
                        )
                        .col(ColumnDef::new(Shipments::TrackingNumber).string_len(100).null())
                        .col(ColumnDef::new(Shipments::Notes).text().null())
                        .col(ColumnDef::new(Shipments::CreatedBy).integer().null())
                        .col(created_at_col(Shipments::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_shipments_customer_id",
                            (Shipments::Table, Shipments::CustomerId),
                            (Customers::Table, Customers::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_shipments_sales_order_id",
                            (Shipments::Table, Shipments::SalesOrderId),
                            (SalesOrders::Table, SalesOrders::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_shipments_created_by",
                            (Shipments::Table, Shipments::CreatedBy),
                            (Users::Table, Users::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShipmentItems::Table)
                        .if_not_exists()
                        .col(id_col(ShipmentItems::Id))
                        .col(ColumnDef::new(ShipmentItems::ShipmentId).integer().not_null())
                        .col(ColumnDef::new(ShipmentItems::SalesOrderItemId).integer().null())
                        .col(ColumnDef::new(ShipmentItems::PartNumberId).integer().not_null())
                        .col(ColumnDef::new(ShipmentItems::ProductionOrderId).integer().null())
                        .col(ColumnDef::new(ShipmentItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(ShipmentItems::UnitPrice).decimal_len(10, 2).null())
                        .col(created_at_col(ShipmentItems::CreatedAt))
                        .foreign_key(&mut fk(
                            "fk_shipment_items_shipment_id",
                            (ShipmentItems::Table, ShipmentItems::ShipmentId),
                            (Shipments::Table, Shipments::Id),
                            ForeignKeyAction::Cascade,
                        ))
                        .foreign_key(&mut fk(
                            "fk_shipment_items_sales_order_item_id",
                            (ShipmentItems::Table, ShipmentItems::SalesOrderItemId),
                            (SalesOrderItems::Table, SalesOrderItems::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .foreign_key(&mut fk(
                            "fk_shipment_items_part_number_id",
                            (ShipmentItems::Table, ShipmentItems::PartNumberId),
                            (PartNumbers::Table, PartNumbers::Id),
                            ForeignKeyAction::Restrict,
                        ))
                        .foreign_key(&mut fk(
                            "fk_shipment_items_production_order_id",
                            (ShipmentItems::Table, ShipmentItems::ProductionOrderId),
                            (ProductionOrders::Table, ProductionOrders::Id),
                            ForeignKeyAction::SetNull,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShipmentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000008_add_performance_indexes {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_add_performance_indexes"
        }
    }

    const INDEX_NAMES: &[&str] = &[
        "idx_production_orders_status",
        "idx_production_orders_part_number_id",
        "idx_production_orders_sales_order_id",
        "idx_production_orders_due_date",
        "idx_sales_orders_customer_id",
        "idx_sales_orders_status",
        "idx_sales_order_items_sales_order_id",
        "idx_travel_sheets_production_order_id",
        "idx_travel_sheet_operations_travel_sheet_id",
        "idx_travel_sheet_operations_status",
        "idx_travel_sheet_operations_operator_id",
        "idx_quality_inspections_production_order_id",
        "idx_shipment_items_production_order_id",
        "idx_shipments_customer_id",
        "idx_inventory_batches_heat_number",
        "idx_inventory_movements_material_id",
        "idx_part_numbers_customer_id",
        "idx_part_routings_part_number_id",
    ];

    fn index(name: &str, table: impl IntoIden + 'static, col: impl IntoIden) -> IndexCreateStatement {
        Index::create()
            .if_not_exists()
            .name(name)
            .table(table)
            .col(col)
            .to_owned()
    }

    fn indexes() -> Vec<IndexCreateStatement> {
        vec![
            index(
                "idx_production_orders_status",
                ProductionOrders::Table,
                ProductionOrders::Status,
            ),
            index(
                "idx_production_orders_part_number_id",
                ProductionOrders::Table,
                ProductionOrders::PartNumberId,
            ),
            index(
                "idx_production_orders_sales_order_id",
                ProductionOrders::Table,
                ProductionOrders::SalesOrderId,
            ),
            index(
                "idx_production_orders_due_date",
                ProductionOrders::Table,
                ProductionOrders::DueDate,
            ),
            index(
                "idx_sales_orders_customer_id",
                SalesOrders::Table,
                SalesOrders::CustomerId,
            ),
            index("idx_sales_orders_status", SalesOrders::Table, SalesOrders::Status),
            index(
                "idx_sales_order_items_sales_order_id",
                SalesOrderItems::Table,
                SalesOrderItems::SalesOrderId,
            ),
            index(
                "idx_travel_sheets_production_order_id",
                TravelSheets::Table,
                TravelSheets::ProductionOrderId,
            ),
            index(
                "idx_travel_sheet_operations_travel_sheet_id",
                TravelSheetOperations::Table,
                TravelSheetOperations::TravelSheetId,
            ),
            index(
                "idx_travel_sheet_operations_status",
                TravelSheetOperations::Table,
                TravelSheetOperations::Status,
            ),
            index(
                "idx_travel_sheet_operations_operator_id",
                TravelSheetOperations::Table,
                TravelSheetOperations::OperatorId,
            ),
            index(
                "idx_quality_inspections_production_order_id",
                QualityInspections::Table,
                QualityInspections::ProductionOrderId,
            ),
            index(
                "idx_shipment_items_production_order_id",
                ShipmentItems::Table,
                ShipmentItems::ProductionOrderId,
            ),
            index(
                "idx_shipments_customer_id",
                Shipments::Table,
                Shipments::CustomerId,
            ),
            index(
                "idx_inventory_batches_heat_number",
                InventoryBatches::Table,
                InventoryBatches::HeatNumber,
            ),
            index(
                "idx_inventory_movements_material_id",
                InventoryMovements::Table,
                InventoryMovements::MaterialId,
            ),
            index(
                "idx_part_numbers_customer_id",
                PartNumbers::Table,
                PartNumbers::CustomerId,
            ),
            index(
                "idx_part_routings_part_number_id",
                PartRoutings::Table,
                PartRoutings::PartNumberId,
            ),
        ]
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for statement in indexes() {
                manager.create_index(statement).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for name in INDEX_NAMES {
                manager
                    .drop_index(Index::drop().if_exists().name(*name).to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

/// Connects to `db_url` and applies every pending migration.
pub async fn run_migration(db_url: &str) -> anyhow::Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
