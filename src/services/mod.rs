// Access and audit
pub mod audit;
pub mod users;

// Master data
pub mod customers;
pub mod inventory;
pub mod part_numbers;
pub mod work_centers;

// Order flow
pub mod production_orders;
pub mod sales_orders;
pub mod shipments;

// Shop floor and quality
pub mod quality;
pub mod shop_floor;

// Reporting
pub mod dashboard;
pub mod exports;

// Document numbers
pub mod numbering;
