//! Order Repository
//!
//! Loads orders joined with their table and line items and normalizes the
//! gateway's embedded-relation shapes into [`OrderAggregate`]s.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use shared::models::OneOrMany;
use shared::order::{LineItem, Order, OrderAggregate, OrderStatus, Station, StationStatus, TableRef};

use super::decode;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{tables, DataGateway, Filter, Query};

/// Selection of orders for a board or report
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Orders whose given station still has work (submitted or preparing)
    pub station_pending: Option<Station>,
    /// Restrict to these global statuses
    pub statuses: Vec<OrderStatus>,
    /// Drop settled orders
    pub exclude_paid: bool,
    /// Restrict to one table
    pub table_id: Option<String>,
    /// Lower bound on creation time
    pub created_from: Option<DateTime<Utc>>,
    /// Sort newest first (reports) instead of oldest first (boards)
    pub newest_first: bool,
}

impl OrderFilter {
    /// Working set of a station board: that station's unserved orders
    pub fn station_board(station: Station) -> Self {
        Self {
            station_pending: Some(station),
            ..Default::default()
        }
    }

    /// Every order not yet settled (cashier overview)
    pub fn unpaid() -> Self {
        Self {
            exclude_paid: true,
            ..Default::default()
        }
    }

    /// Unsettled orders of one table (cashier check detail)
    pub fn unpaid_for_table(table_id: impl Into<String>) -> Self {
        Self {
            exclude_paid: true,
            table_id: Some(table_id.into()),
            ..Default::default()
        }
    }

    /// Settled orders since the given instant (takings)
    pub fn paid_since(from: DateTime<Utc>) -> Self {
        Self {
            statuses: vec![OrderStatus::Paid],
            created_from: Some(from),
            ..Default::default()
        }
    }

    /// Everything in a date range, newest first (reports)
    pub fn report(from: Option<DateTime<Utc>>) -> Self {
        Self {
            created_from: from,
            newest_first: true,
            ..Default::default()
        }
    }

    fn predicates(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(station) = self.station_pending {
            let column = match station {
                Station::Kitchen => "kitchen_status",
                Station::Bar => "bar_status",
            };
            filters.push(Filter::is_in(
                column,
                vec![
                    status_value(StationStatus::Submitted),
                    status_value(StationStatus::Preparing),
                ],
            ));
        }
        if !self.statuses.is_empty() {
            filters.push(Filter::is_in(
                "status",
                self.statuses.iter().map(|s| global_value(*s)).collect(),
            ));
        }
        if self.exclude_paid {
            filters.push(Filter::neq("status", global_value(OrderStatus::Paid)));
        }
        if let Some(table_id) = &self.table_id {
            filters.push(Filter::eq("table_id", table_id.as_str()));
        }
        if let Some(from) = self.created_from {
            filters.push(Filter::gte("created_at", from.to_rfc3339()));
        }
        filters
    }
}

fn status_value(status: StationStatus) -> Value {
    serde_json::to_value(status).unwrap_or(Value::Null)
}

fn global_value(status: OrderStatus) -> Value {
    serde_json::to_value(status).unwrap_or(Value::Null)
}

/// Raw joined row as the gateway returns it
#[derive(Debug, Deserialize)]
struct OrderRow {
    #[serde(flatten)]
    order: Order,
    #[serde(default)]
    dining_tables: Option<OneOrMany<TableRef>>,
    #[serde(default)]
    order_items: Vec<LineItemRow>,
}

#[derive(Debug, Deserialize)]
struct LineItemRow {
    id: String,
    order_id: String,
    product_id: String,
    quantity: i32,
    #[serde(default)]
    note: Option<String>,
    subtotal: f64,
    #[serde(default)]
    products: Option<OneOrMany<ProductRef>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductRef {
    name: String,
    category: String,
}

impl OrderRow {
    fn normalize(self) -> OrderAggregate {
        OrderAggregate {
            order: self.order,
            table: self.dining_tables.and_then(OneOrMany::into_one),
            lines: self.order_items.into_iter().map(LineItemRow::normalize).collect(),
        }
    }
}

impl LineItemRow {
    fn normalize(self) -> LineItem {
        let product = self.products.and_then(OneOrMany::into_one);
        let (product_name, category) = match product {
            Some(p) => (p.name, p.category),
            None => ("Product".to_string(), String::new()),
        };
        LineItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            note: self.note,
            subtotal: self.subtotal,
            product_name,
            category,
        }
    }
}

#[derive(Clone)]
pub struct OrderRepository {
    gateway: Arc<dyn DataGateway>,
}

impl OrderRepository {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Load joined order aggregates matching the filter
    pub async fn load(&self, filter: &OrderFilter) -> ClientResult<Vec<OrderAggregate>> {
        let mut query = Query::new()
            .embed(tables::DINING_TABLES)
            .embed(tables::ORDER_ITEMS)
            .embed(format!("{}.{}", tables::ORDER_ITEMS, tables::PRODUCTS))
            .order_by("created_at", !filter.newest_first);
        query.filters = filter.predicates();

        let rows = self.gateway.select(tables::ORDERS, query).await?;
        rows.into_iter()
            .map(|row| Ok(decode::<OrderRow>(row)?.normalize()))
            .collect()
    }

    /// Load one order aggregate
    pub async fn find(&self, order_id: &str) -> ClientResult<Option<OrderAggregate>> {
        let query = Query::new()
            .filter(Filter::eq("id", order_id))
            .embed(tables::DINING_TABLES)
            .embed(tables::ORDER_ITEMS)
            .embed(format!("{}.{}", tables::ORDER_ITEMS, tables::PRODUCTS));
        let rows = self.gateway.select(tables::ORDERS, query).await?;
        rows.into_iter()
            .next()
            .map(|row| Ok(decode::<OrderRow>(row)?.normalize()))
            .transpose()
    }

    /// Load one order aggregate or fail
    pub async fn get(&self, order_id: &str) -> ClientResult<OrderAggregate> {
        self.find(order_id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))
    }

    /// Patch fields of one order, returning the updated row
    pub async fn patch(&self, order_id: &str, patch: Value) -> ClientResult<Order> {
        let rows = self
            .gateway
            .update(tables::ORDERS, vec![Filter::eq("id", order_id)], patch)
            .await?;
        rows.into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))
    }

    /// Insert the order header, returning the stored row
    pub async fn insert(&self, row: Value) -> ClientResult<Order> {
        let stored = self.gateway.insert(tables::ORDERS, row).await?;
        decode(stored)
    }
}
