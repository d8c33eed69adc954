//! sea-orm entities for the shop-floor schema.

pub mod audit_log;
pub mod customer;
pub mod enums;
pub mod inventory_batch;
pub mod inventory_movement;
pub mod machine;
pub mod material;
pub mod part_material;
pub mod part_number;
pub mod part_routing;
pub mod part_sub_assembly;
pub mod process;
pub mod production_order;
pub mod quality_inspection;
pub mod role;
pub mod sales_order;
pub mod sales_order_item;
pub mod shipment;
pub mod shipment_item;
pub mod supplier;
pub mod travel_sheet;
pub mod travel_sheet_operation;
pub mod user;
pub mod work_center;
