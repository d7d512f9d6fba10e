//! Order domain types

pub mod status;
pub mod types;

pub use status::{ready_to_serve, OrderStatus, PaymentMethod, Station, StationStatus, TransitionError};
pub use types::{CartLine, LineItem, Order, OrderAggregate, TableRef};
