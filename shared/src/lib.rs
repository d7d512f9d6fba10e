//! Shared domain types for the comanda POS client
//!
//! Entity models, the order status state machine and the serde helpers
//! used to normalize rows coming back from the remote data gateway.
//! This crate performs no I/O.

pub mod models;
pub mod order;

pub use order::status::{OrderStatus, PaymentMethod, Station, StationStatus, TransitionError};
