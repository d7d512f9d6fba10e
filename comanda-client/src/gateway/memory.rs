//! In-process gateway implementation
//!
//! Backs the test suite and local mode with the same contract the hosted
//! service provides: predicate evaluation, relation embedding,
//! restrict-on-delete referential checks and per-table change feeds over
//! tokio broadcast channels.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{
    tables, ChangeEvent, ChangeFeed, ChangeKind, DataGateway, Filter, GatewayError, Mutation, Op,
    Query,
};

/// Per-table change channel capacity
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// In-memory data gateway
#[derive(Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: RwLock<HashMap<String, Vec<Value>>>,
    feeds: RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

/// Static join topology between the remote tables
struct Relation {
    child: &'static str,
    local_key: &'static str,
    foreign_key: &'static str,
    to_one: bool,
}

fn relation(parent: &str, name: &str) -> Option<Relation> {
    match (parent, name) {
        (tables::ORDERS, tables::DINING_TABLES) => Some(Relation {
            child: tables::DINING_TABLES,
            local_key: "table_id",
            foreign_key: "id",
            to_one: true,
        }),
        (tables::ORDERS, tables::ORDER_ITEMS) => Some(Relation {
            child: tables::ORDER_ITEMS,
            local_key: "id",
            foreign_key: "order_id",
            to_one: false,
        }),
        (tables::ORDER_ITEMS, tables::PRODUCTS) => Some(Relation {
            child: tables::PRODUCTS,
            local_key: "product_id",
            foreign_key: "id",
            to_one: true,
        }),
        _ => None,
    }
}

/// Referential checks enforced on delete (restrict, like the hosted schema)
fn referencing(parent: &str) -> &'static [(&'static str, &'static str, &'static str)] {
    match parent {
        tables::DINING_TABLES => &[(tables::ORDERS, "table_id", "orders_table_id_fkey")],
        tables::PRODUCTS => &[(
            tables::ORDER_ITEMS,
            "product_id",
            "order_items_product_id_fkey",
        )],
        _ => &[],
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, table: &str) -> broadcast::Sender<ChangeEvent> {
        let mut feeds = self.inner.feeds.write();
        feeds
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .clone()
    }

    fn emit(&self, events: Vec<ChangeEvent>) {
        let feeds = self.inner.feeds.read();
        for event in events {
            if let Some(tx) = feeds.get(&event.table) {
                // No subscribers is not an error
                let _ = tx.send(event);
            }
        }
    }

    /// Execute one mutation against the live row map, returning the events
    /// it produced. Caller handles atomicity.
    fn execute(
        rows: &mut HashMap<String, Vec<Value>>,
        mutation: Mutation,
    ) -> Result<Vec<ChangeEvent>, GatewayError> {
        match mutation {
            Mutation::Insert { table, row } => {
                let row = prepare_insert(row);
                rows.entry(table.clone()).or_default().push(row.clone());
                Ok(vec![ChangeEvent {
                    table,
                    kind: ChangeKind::Inserted,
                    row,
                }])
            }
            Mutation::Update {
                table,
                filters,
                patch,
            } => {
                let mut events = Vec::new();
                if let Some(stored) = rows.get_mut(&table) {
                    for row in stored.iter_mut().filter(|r| matches(r, &filters)) {
                        merge_patch(row, &patch);
                        events.push(ChangeEvent {
                            table: table.clone(),
                            kind: ChangeKind::Updated,
                            row: row.clone(),
                        });
                    }
                }
                Ok(events)
            }
            Mutation::Delete { table, filters } => {
                // Restrict-on-delete: every row about to go must be
                // unreferenced at this point in the batch.
                let doomed: Vec<Value> = rows
                    .get(&table)
                    .map(|stored| {
                        stored
                            .iter()
                            .filter(|r| matches(r, &filters))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();

                for (ref_table, ref_column, constraint) in referencing(&table) {
                    let referencing_rows = rows.get(*ref_table);
                    for row in &doomed {
                        let id = row.get("id").cloned().unwrap_or(Value::Null);
                        let referenced = referencing_rows
                            .map(|stored| {
                                stored.iter().any(|r| {
                                    value_eq(r.get(*ref_column).unwrap_or(&Value::Null), &id)
                                })
                            })
                            .unwrap_or(false);
                        if referenced {
                            return Err(GatewayError::Constraint((*constraint).to_string()));
                        }
                    }
                }

                if let Some(stored) = rows.get_mut(&table) {
                    stored.retain(|r| !matches(r, &filters));
                }
                Ok(doomed
                    .into_iter()
                    .map(|row| ChangeEvent {
                        table: table.clone(),
                        kind: ChangeKind::Deleted,
                        row,
                    })
                    .collect())
            }
        }
    }

    fn embed_relations(
        &self,
        rows_guard: &HashMap<String, Vec<Value>>,
        parent: &str,
        row: &mut Value,
        embeds: &[String],
    ) -> Result<(), GatewayError> {
        // Group "a" / "a.b" paths by their top relation
        let mut grouped: HashMap<&str, Vec<String>> = HashMap::new();
        for path in embeds {
            let (top, rest) = match path.split_once('.') {
                Some((top, rest)) => (top, Some(rest.to_string())),
                None => (path.as_str(), None),
            };
            let nested = grouped.entry(top).or_default();
            if let Some(rest) = rest {
                nested.push(rest);
            }
        }

        for (name, nested) in grouped {
            let rel = relation(parent, name).ok_or_else(|| {
                GatewayError::Unavailable(format!("unknown relation {parent}.{name}"))
            })?;
            let local = row.get(rel.local_key).cloned().unwrap_or(Value::Null);
            let mut children: Vec<Value> = if local.is_null() {
                Vec::new()
            } else {
                rows_guard
                    .get(rel.child)
                    .map(|stored| {
                        stored
                            .iter()
                            .filter(|r| {
                                value_eq(r.get(rel.foreign_key).unwrap_or(&Value::Null), &local)
                            })
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            };
            for child in children.iter_mut() {
                self.embed_relations(rows_guard, rel.child, child, &nested)?;
            }
            let embedded = if rel.to_one {
                // To-one relations arrive as a bare object (or null)
                children.into_iter().next().unwrap_or(Value::Null)
            } else {
                Value::Array(children)
            };
            if let Some(obj) = row.as_object_mut() {
                obj.insert(name.to_string(), embedded);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>, GatewayError> {
        let rows_guard = self.inner.rows.read();
        let mut selected: Vec<Value> = rows_guard
            .get(table)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|r| matches(r, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for key in query.order_by.iter().rev() {
            selected.sort_by(|a, b| {
                let ord = value_cmp(
                    a.get(&key.column).unwrap_or(&Value::Null),
                    b.get(&key.column).unwrap_or(&Value::Null),
                );
                if key.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        for row in selected.iter_mut() {
            self.embed_relations(&rows_guard, table, row, &query.embed)?;
        }
        Ok(selected)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, GatewayError> {
        let row = prepare_insert(row);
        {
            let mut rows = self.inner.rows.write();
            rows.entry(table.to_string()).or_default().push(row.clone());
        }
        self.emit(vec![ChangeEvent {
            table: table.to_string(),
            kind: ChangeKind::Inserted,
            row: row.clone(),
        }]);
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, GatewayError> {
        let events = {
            let mut rows = self.inner.rows.write();
            Self::execute(&mut rows, Mutation::update(table, filters, patch))?
        };
        let updated: Vec<Value> = events.iter().map(|e| e.row.clone()).collect();
        self.emit(events);
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<u64, GatewayError> {
        let events = {
            let mut rows = self.inner.rows.write();
            Self::execute(&mut rows, Mutation::delete(table, filters))?
        };
        let removed = events.len() as u64;
        self.emit(events);
        Ok(removed)
    }

    async fn apply(&self, mutations: Vec<Mutation>) -> Result<(), GatewayError> {
        let events = {
            let mut rows = self.inner.rows.write();
            let snapshot = rows.clone();
            let mut events = Vec::new();
            for mutation in mutations {
                match Self::execute(&mut rows, mutation) {
                    Ok(produced) => events.extend(produced),
                    Err(err) => {
                        // All-or-nothing: restore the pre-batch state
                        *rows = snapshot;
                        return Err(err);
                    }
                }
            }
            events
        };
        self.emit(events);
        Ok(())
    }

    fn subscribe(&self, table: &str) -> ChangeFeed {
        ChangeFeed::new(self.sender(table).subscribe())
    }
}

/// Fill in server-assigned fields on insert
fn prepare_insert(row: Value) -> Value {
    let mut obj = match row {
        Value::Object(obj) => obj,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    let missing_id = obj.get("id").map(Value::is_null).unwrap_or(true);
    if missing_id {
        obj.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }
    let missing_created = obj.get("created_at").map(Value::is_null).unwrap_or(true);
    if missing_created {
        obj.insert(
            "created_at".to_string(),
            serde_json::to_value(Utc::now()).unwrap_or(Value::Null),
        );
    }
    Value::Object(obj)
}

fn merge_patch(row: &mut Value, patch: &Value) {
    if let (Some(obj), Some(patch_obj)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            obj.insert(key.clone(), value.clone());
        }
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let actual = row.get(&filter.column).unwrap_or(&Value::Null);
        match &filter.op {
            Op::Eq(expected) => value_eq(actual, expected),
            Op::Neq(expected) => !value_eq(actual, expected),
            Op::Gt(expected) => ordered_cmp(actual, expected) == Some(Ordering::Greater),
            Op::Gte(expected) => matches!(
                ordered_cmp(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Op::Lt(expected) => ordered_cmp(actual, expected) == Some(Ordering::Less),
            Op::Lte(expected) => matches!(
                ordered_cmp(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Op::In(values) => values.iter().any(|v| value_eq(actual, v)),
            Op::IsNull => actual.is_null(),
            Op::NotNull => !actual.is_null(),
        }
    })
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Comparison for range predicates; `None` for null or mixed-type operands
fn ordered_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().unwrap_or(0.0).partial_cmp(&y.as_f64().unwrap_or(0.0))
        }
        (Value::String(x), Value::String(y)) => Some(str_cmp(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: nulls first, then by type-aware value
fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => ordered_cmp(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Timestamps compare as instants when both sides parse as RFC 3339
fn str_cmp(x: &str, y: &str) -> Ordering {
    match (
        DateTime::parse_from_rfc3339(x),
        DateTime::parse_from_rfc3339(y),
    ) {
        (Ok(dx), Ok(dy)) => dx.cmp(&dy),
        _ => x.cmp(y),
    }
}
