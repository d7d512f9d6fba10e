//! Serde helpers for gateway row normalization
//!
//! The hosted store returns embedded join relations either as a single
//! object or as an array of rows depending on how the relation was
//! declared. `OneOrMany` absorbs both shapes at the decode boundary so the
//! rest of the crate only ever sees fixed types.

use serde::{Deserialize, Serialize};

/// An embedded relation that may arrive as one object or a list of them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Collapse a to-one relation, taking the first row of a list shape
    pub fn into_one(self) -> Option<T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
        }
    }

    /// Flatten into a list regardless of the wire shape
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}
