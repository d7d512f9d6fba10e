//! Entity models mirroring the remote tables

pub mod dining_table;
pub mod product;
pub mod serde_helpers;

pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate, TableState};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use serde_helpers::OneOrMany;
