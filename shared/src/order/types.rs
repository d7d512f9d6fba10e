//! Order row shapes and the normalized aggregate
//!
//! `Order` and `LineItem` mirror the remote rows one-to-one; the embedded
//! join relations are normalized into `OrderAggregate` at the data-access
//! boundary so screens never touch the gateway's object-or-array shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{OrderStatus, PaymentMethod, Station, StationStatus};

/// One customer check opened against a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Owning table; `None` after the table was deleted and its history
    /// detached for reporting.
    pub table_id: Option<String>,
    /// Global status, derived from the station statuses
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub kitchen_status: StationStatus,
    /// Present only when the order carries at least one bar line item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_status: Option<StationStatus>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub tip: f64,
    pub created_at: DateTime<Utc>,
    /// Stamped once, when the global status first becomes served
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Line item owned by an order, with the joined product snapshot already
/// normalized into flat fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub subtotal: f64,
    pub product_name: String,
    pub category: String,
}

impl LineItem {
    /// Which station prepares this line, by product category
    pub fn station(&self, bar_category: &str) -> Station {
        if self.category.eq_ignore_ascii_case(bar_category) {
            Station::Bar
        } else {
            Station::Kitchen
        }
    }
}

/// Embedded table reference carried on joined order rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRef {
    pub id: String,
    pub number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TableRef {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Table {}", self.number))
    }
}

/// Order plus its normalized relations - the unit the aggregate store caches
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAggregate {
    pub order: Order,
    pub table: Option<TableRef>,
    pub lines: Vec<LineItem>,
}

impl OrderAggregate {
    pub fn has_bar_lines(&self, bar_category: &str) -> bool {
        self.lines
            .iter()
            .any(|l| l.station(bar_category) == Station::Bar)
    }

    /// Lines belonging to the given station
    pub fn station_lines(&self, station: Station, bar_category: &str) -> Vec<&LineItem> {
        self.lines
            .iter()
            .filter(|l| l.station(bar_category) == station)
            .collect()
    }

    /// Current status of the given station, `None` when the order has no
    /// status tracked for it.
    pub fn station_status(&self, station: Station) -> Option<StationStatus> {
        match station {
            Station::Kitchen => Some(self.order.kitchen_status),
            Station::Bar => self.order.bar_status,
        }
    }

    /// Display label for the owning table, falling back to a short id
    /// fragment for detached orders.
    pub fn table_label(&self) -> String {
        match (&self.table, &self.order.table_id) {
            (Some(t), _) => t.label(),
            (None, Some(id)) => format!("Table {}", &id[..id.len().min(4)]),
            (None, None) => "Table ?".to_string(),
        }
    }
}

/// A line accumulated in the cart before submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub note: String,
}
