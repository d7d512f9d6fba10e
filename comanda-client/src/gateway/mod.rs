//! Remote data gateway abstraction
//!
//! The hosted database service is an external collaborator: table-scoped
//! CRUD with filter predicates and ordering, an atomic mutation batch, and
//! a change-subscription feed pushing row-level events. This module defines
//! that contract; [`memory::MemoryGateway`] is the in-process
//! implementation used for tests and local mode.

pub mod memory;

pub use memory::MemoryGateway;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Remote table names
pub mod tables {
    pub const PRODUCTS: &str = "products";
    pub const DINING_TABLES: &str = "dining_tables";
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "order_items";
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: Op,
}

/// Predicate operators supported by the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    IsNull,
    NotNull,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Eq(value.into()),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Neq(value.into()),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Gte(value.into()),
        }
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Lt(value.into()),
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::In(values),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: Op::IsNull,
        }
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: Op::NotNull,
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// A select query: predicates, sort keys and embedded relations.
///
/// Embed names are relation paths one level deep (`"order_items"`,
/// `"order_items.products"`). How an embedded to-one relation is shaped on
/// the wire is up to the service; decoding normalizes it.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub embed: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn embed(mut self, relation: impl Into<String>) -> Self {
        self.embed.push(relation.into());
        self
    }
}

/// One write in an atomic batch
#[derive(Debug, Clone)]
pub enum Mutation {
    Insert {
        table: String,
        row: Value,
    },
    Update {
        table: String,
        filters: Vec<Filter>,
        patch: Value,
    },
    Delete {
        table: String,
        filters: Vec<Filter>,
    },
}

impl Mutation {
    pub fn insert(table: impl Into<String>, row: Value) -> Self {
        Mutation::Insert {
            table: table.into(),
            row,
        }
    }

    pub fn update(table: impl Into<String>, filters: Vec<Filter>, patch: Value) -> Self {
        Mutation::Update {
            table: table.into(),
            filters,
            patch,
        }
    }

    pub fn delete(table: impl Into<String>, filters: Vec<Filter>) -> Self {
        Mutation::Delete {
            table: table.into(),
            filters,
        }
    }
}

/// Kind of row-level change pushed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A pushed row-level change
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub row: Value,
}

/// Subscription handle for one table's change feed
///
/// Dropping the feed unsubscribes; screens drop it on teardown so no
/// callback outlives its view.
pub struct ChangeFeed {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Next pushed change, `None` once the gateway side is gone.
    ///
    /// Delivery is at-least-once; a lagged receiver skips ahead and the
    /// consumer recovers on its next full reload.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Gateway failure taxonomy
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("conflicting batch: {0}")]
    Conflict(String),
}

/// Table-scoped CRUD plus change subscription against the hosted store
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Select rows matching the query, with requested relations embedded
    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>, GatewayError>;

    /// Insert one row; the returned row carries server-assigned fields
    /// (`id`, `created_at`).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, GatewayError>;

    /// Patch all rows matching the filters, returning the updated rows
    async fn update(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, GatewayError>;

    /// Delete all rows matching the filters, returning the count removed
    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<u64, GatewayError>;

    /// Apply a batch of mutations atomically: either every mutation takes
    /// effect or none does.
    async fn apply(&self, mutations: Vec<Mutation>) -> Result<(), GatewayError>;

    /// Subscribe to row-level changes on a table
    fn subscribe(&self, table: &str) -> ChangeFeed;
}
