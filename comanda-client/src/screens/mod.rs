//! Screen controllers
//!
//! One controller per POS screen. Each issues gateway queries, reacts to
//! push notifications by reloading wholesale, and produces plain view-state
//! structs; rendering lives outside this crate. Every gateway failure is
//! logged, surfaced as a toast and never fatal to the screen.

pub mod admin_products;
pub mod admin_tables;
pub mod cashier;
pub mod menu;
pub mod reports;
pub mod station_board;

pub use admin_products::AdminProductsScreen;
pub use admin_tables::{AdminTablesScreen, DeleteOutcome};
pub use cashier::CashierScreen;
pub use menu::MenuScreen;
pub use reports::{ReportRange, ReportsScreen};
pub use station_board::StationBoard;
