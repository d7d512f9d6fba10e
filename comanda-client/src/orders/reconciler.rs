//! Station Status Reconciler
//!
//! The one piece of real domain logic in the client: each order tracks a
//! kitchen status and, when it carries bar items, a bar status. Stations
//! advance independently through `Submitted -> Preparing -> Served`; the
//! global status is derived, never set by a station directly. An order is
//! globally served exactly when the kitchen has served and (there are no
//! bar items or the bar has served); settlement marks it paid and closes
//! the table in the same atomic batch.
//!
//! `reconcile_global` must stay idempotent: two operator terminals may
//! race to trigger it after their station updates, and both invocations
//! have to converge on the same row state.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use shared::order::{
    ready_to_serve, CartLine, OrderAggregate, OrderStatus, PaymentMethod, Station, StationStatus,
};
use shared::models::{DiningTableCreate, TableState};

use super::money;
use crate::db::{OrderRepository, TableRepository};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{tables, DataGateway, Filter, Mutation};

/// Result of removing a line item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemovedLine {
    /// The emptied order was cancelled outright
    pub order_deleted: bool,
    pub new_total: f64,
}

/// Station status state machine over the remote order table
#[derive(Clone)]
pub struct Reconciler {
    gateway: Arc<dyn DataGateway>,
    orders: OrderRepository,
    dining_tables: TableRepository,
    bar_category: String,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn DataGateway>, bar_category: impl Into<String>) -> Self {
        Self {
            orders: OrderRepository::new(gateway.clone()),
            dining_tables: TableRepository::new(gateway.clone()),
            gateway,
            bar_category: bar_category.into(),
        }
    }

    pub fn bar_category(&self) -> &str {
        &self.bar_category
    }

    /// Advance one station of an order to its next status.
    ///
    /// Rejected when the order is already paid, when the station has no
    /// line items, or when the station has already served. Persists the
    /// station status, then reconciles the global status.
    pub async fn advance(&self, order_id: &str, station: Station) -> ClientResult<StationStatus> {
        let agg = self.orders.get(order_id).await?;
        if agg.order.status.is_paid() {
            return Err(ClientError::AlreadyPaid(order_id.to_string()));
        }
        if agg.station_lines(station, &self.bar_category).is_empty() {
            return Err(ClientError::invalid_transition(
                order_id,
                format!("order has no {station} items"),
            ));
        }
        let current = agg
            .station_status(station)
            .ok_or_else(|| {
                ClientError::invalid_transition(order_id, format!("no {station} status tracked"))
            })?;
        let next = current.advance().map_err(|e| {
            ClientError::invalid_transition(order_id, e.to_string())
        })?;

        let column = match station {
            Station::Kitchen => "kitchen_status",
            Station::Bar => "bar_status",
        };
        // Only the station column moves; the global status is derived
        let mut patch = serde_json::Map::new();
        patch.insert(column.to_string(), serde_json::to_value(next)?);
        self.orders.patch(order_id, Value::Object(patch)).await?;
        tracing::info!(order_id, %station, status = ?next, "station advanced");

        self.reconcile_global(order_id).await?;
        Ok(next)
    }

    /// Derive the global status from the station statuses.
    ///
    /// When the serve condition newly holds, marks the order served and
    /// stamps `finished_at` - exactly once. Re-invocation when nothing
    /// changed is a no-op, so concurrent triggers from racing terminals
    /// converge.
    pub async fn reconcile_global(&self, order_id: &str) -> ClientResult<()> {
        let agg = self.orders.get(order_id).await?;
        if !agg.order.status.is_pending() {
            return Ok(());
        }
        let bar = if agg.has_bar_lines(&self.bar_category) {
            Some(agg.order.bar_status.unwrap_or_default())
        } else {
            None
        };
        if ready_to_serve(agg.order.kitchen_status, bar) {
            self.orders
                .patch(
                    order_id,
                    json!({
                        "status": OrderStatus::Served,
                        "finished_at": Utc::now(),
                    }),
                )
                .await?;
            tracing::info!(order_id, "order fully served");
        }
        Ok(())
    }

    /// Remove one line item from an order that has not started preparation.
    ///
    /// Deleting the last line cancels the order outright; otherwise the
    /// order total is recomputed from the remaining lines in the same
    /// atomic batch, so racing removals cannot apply a stale subtraction.
    pub async fn remove_line_item(
        &self,
        order_id: &str,
        line_item_id: &str,
    ) -> ClientResult<RemovedLine> {
        let agg = self.orders.get(order_id).await?;
        if agg.order.status.is_paid() {
            return Err(ClientError::AlreadyPaid(order_id.to_string()));
        }
        let line = agg
            .lines
            .iter()
            .find(|l| l.id == line_item_id)
            .ok_or_else(|| ClientError::NotFound(format!("line item {}", line_item_id)))?;

        let station = line.station(&self.bar_category);
        let status = agg.station_status(station).unwrap_or_default();
        if status != StationStatus::Submitted {
            return Err(ClientError::invalid_transition(
                order_id,
                format!("{station} already started preparing, line cannot be removed"),
            ));
        }

        let remaining: Vec<f64> = agg
            .lines
            .iter()
            .filter(|l| l.id != line_item_id)
            .map(|l| l.subtotal)
            .collect();

        if remaining.is_empty() {
            // An emptied order is cancelled, not kept as a zero-total record
            self.gateway
                .apply(vec![
                    Mutation::delete(
                        tables::ORDER_ITEMS,
                        vec![Filter::eq("id", line_item_id)],
                    ),
                    Mutation::delete(tables::ORDERS, vec![Filter::eq("id", order_id)]),
                ])
                .await?;
            tracing::info!(order_id, "order cancelled, last line removed");
            return Ok(RemovedLine {
                order_deleted: true,
                new_total: 0.0,
            });
        }

        let new_total = money::sum_subtotals(remaining);
        self.gateway
            .apply(vec![
                Mutation::delete(
                    tables::ORDER_ITEMS,
                    vec![Filter::eq("id", line_item_id)],
                ),
                Mutation::update(
                    tables::ORDERS,
                    vec![Filter::eq("id", order_id)],
                    json!({"total": new_total}),
                ),
            ])
            .await?;
        tracing::info!(order_id, line_item_id, new_total, "line removed");
        Ok(RemovedLine {
            order_deleted: false,
            new_total,
        })
    }

    /// Settle a batch of orders against one table.
    ///
    /// Every order is marked paid with the method and the identical tip,
    /// and the table is closed - all in a single atomic batch.
    pub async fn settle(
        &self,
        order_ids: &[String],
        method: PaymentMethod,
        tip: f64,
    ) -> ClientResult<()> {
        if order_ids.is_empty() {
            return Err(ClientError::EmptySelection("no orders to settle"));
        }

        let mut table_id: Option<String> = None;
        for order_id in order_ids {
            let agg = self.orders.get(order_id).await?;
            if agg.order.status.is_paid() {
                return Err(ClientError::AlreadyPaid(order_id.clone()));
            }
            match (&table_id, &agg.order.table_id) {
                (None, current) => table_id = current.clone(),
                (Some(expected), Some(current)) if expected == current => {}
                _ => {
                    return Err(ClientError::ConstraintViolation(
                        "orders span more than one table".to_string(),
                    ));
                }
            }
        }

        let tip = money::round_money(tip);
        let mut mutations: Vec<Mutation> = order_ids
            .iter()
            .map(|order_id| {
                Mutation::update(
                    tables::ORDERS,
                    vec![Filter::eq("id", order_id.as_str())],
                    json!({
                        "status": OrderStatus::Paid,
                        "payment_method": method,
                        "tip": tip,
                    }),
                )
            })
            .collect();
        if let Some(table_id) = &table_id {
            mutations.push(Mutation::update(
                tables::DINING_TABLES,
                vec![Filter::eq("id", table_id.as_str())],
                json!({"state": TableState::Closed}),
            ));
        }
        self.gateway.apply(mutations).await?;
        tracing::info!(
            orders = order_ids.len(),
            %method,
            tip,
            "check settled, table closed"
        );
        Ok(())
    }

    /// Submit a cart as a new order against a table number.
    ///
    /// The table is created (or re-opened) implicitly; the bar status is
    /// only tracked when the cart carries bar-category lines.
    pub async fn submit(&self, table_number: i32, lines: &[CartLine]) -> ClientResult<String> {
        if lines.is_empty() {
            return Err(ClientError::EmptySelection("cart is empty"));
        }

        let table = match self.dining_tables.find_by_number(table_number).await? {
            Some(table) => {
                if !table.is_open() {
                    self.dining_tables
                        .set_state(&table.id, TableState::Open)
                        .await?;
                }
                table
            }
            None => {
                let table = self
                    .dining_tables
                    .create(DiningTableCreate {
                        number: table_number,
                        name: None,
                    })
                    .await?;
                self.dining_tables
                    .set_state(&table.id, TableState::Open)
                    .await?;
                table
            }
        };

        let has_bar = lines
            .iter()
            .any(|l| l.category.eq_ignore_ascii_case(&self.bar_category));
        let total = money::cart_total(lines);

        let order = self
            .orders
            .insert(json!({
                "table_id": table.id,
                "status": OrderStatus::Submitted,
                "kitchen_status": StationStatus::Submitted,
                "bar_status": if has_bar {
                    serde_json::to_value(StationStatus::Submitted)?
                } else {
                    Value::Null
                },
                "total": total,
                "tip": 0.0,
            }))
            .await?;

        let item_rows: Vec<Mutation> = lines
            .iter()
            .map(|line| {
                Mutation::insert(
                    tables::ORDER_ITEMS,
                    json!({
                        "order_id": order.id,
                        "product_id": line.product_id,
                        "quantity": line.quantity,
                        "note": if line.note.is_empty() { Value::Null } else { Value::from(line.note.clone()) },
                        "subtotal": money::line_subtotal(line.price, line.quantity),
                    }),
                )
            })
            .collect();
        self.gateway.apply(item_rows).await?;

        tracing::info!(
            order_id = %order.id,
            table = table_number,
            lines = lines.len(),
            total,
            "order submitted"
        );
        Ok(order.id)
    }

    /// Load the current aggregate of one order
    pub async fn order(&self, order_id: &str) -> ClientResult<OrderAggregate> {
        self.orders.get(order_id).await
    }
}
