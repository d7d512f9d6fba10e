//! Typed repositories over the data gateway
//!
//! Each repository owns one remote table: it builds queries, decodes the
//! returned rows into the shared models and normalizes embedded relations.

pub mod orders;
pub mod products;
pub mod tables;

pub use orders::{OrderFilter, OrderRepository};
pub use products::ProductRepository;
pub use tables::TableRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientResult;

fn decode<T: DeserializeOwned>(row: Value) -> ClientResult<T> {
    Ok(serde_json::from_value(row)?)
}

fn decode_all<T: DeserializeOwned>(rows: Vec<Value>) -> ClientResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}
