//! Order status state machine
//!
//! Station and global statuses are explicit enums with a fixed transition
//! table, so an illegal transition is a structural error instead of a
//! string comparison scattered across screens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preparation station working an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    Kitchen,
    Bar,
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Station::Kitchen => write!(f, "kitchen"),
            Station::Bar => write!(f, "bar"),
        }
    }
}

/// Per-station preparation status
///
/// Progression is `Submitted -> Preparing -> Served`, one step at a time.
/// `Served` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    #[default]
    Submitted,
    Preparing,
    Served,
}

impl StationStatus {
    /// Next status in the fixed progression, `None` once served.
    pub fn next(self) -> Option<StationStatus> {
        match self {
            StationStatus::Submitted => Some(StationStatus::Preparing),
            StationStatus::Preparing => Some(StationStatus::Served),
            StationStatus::Served => None,
        }
    }

    /// Advance one step, failing once the terminal state is reached.
    pub fn advance(self) -> Result<StationStatus, TransitionError> {
        self.next().ok_or(TransitionError::Terminal(self))
    }

    pub fn is_served(self) -> bool {
        self == StationStatus::Served
    }
}

/// Global order status
///
/// Derived, never set directly by a station action: `Served` only via the
/// reconciliation invariant, `Paid` only via settlement. Both are terminal
/// for station mutations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Submitted,
    Preparing,
    Served,
    Paid,
}

impl OrderStatus {
    pub fn is_paid(self) -> bool {
        self == OrderStatus::Paid
    }

    /// Whether the global status may still move to `Served`
    pub fn is_pending(self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Preparing)
    }
}

/// Payment method recorded at settlement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

/// Whether an order is ready for global `Served`: the kitchen has served
/// and, when the order carries bar items, so has the bar. `bar` is `None`
/// for orders without bar items.
pub fn ready_to_serve(kitchen: StationStatus, bar: Option<StationStatus>) -> bool {
    kitchen.is_served() && bar.is_none_or(|b| b.is_served())
}

/// Station transition rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("station already {0:?}, no further transition")]
    Terminal(StationStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [StationStatus; 3] = [
        StationStatus::Submitted,
        StationStatus::Preparing,
        StationStatus::Served,
    ];

    #[test]
    fn test_station_progression_no_skip_no_backward() {
        assert_eq!(
            StationStatus::Submitted.next(),
            Some(StationStatus::Preparing)
        );
        assert_eq!(StationStatus::Preparing.next(), Some(StationStatus::Served));
        assert_eq!(StationStatus::Served.next(), None);
    }

    #[test]
    fn test_advance_from_served_fails() {
        let err = StationStatus::Served.advance().unwrap_err();
        assert_eq!(err, TransitionError::Terminal(StationStatus::Served));
    }

    #[test]
    fn test_ready_to_serve_all_combinations() {
        // Exhaustive over kitchen x (no bar | bar status)
        for kitchen in ALL {
            assert_eq!(ready_to_serve(kitchen, None), kitchen.is_served());
            for bar in ALL {
                assert_eq!(
                    ready_to_serve(kitchen, Some(bar)),
                    kitchen.is_served() && bar.is_served()
                );
            }
        }
    }

    #[test]
    fn test_status_serde_wire_format() {
        assert_eq!(
            serde_json::to_value(StationStatus::Preparing).unwrap(),
            serde_json::json!("PREPARING")
        );
        assert_eq!(
            serde_json::from_value::<OrderStatus>(serde_json::json!("PAID")).unwrap(),
            OrderStatus::Paid
        );
    }

    #[test]
    fn test_global_status_predicates() {
        assert!(OrderStatus::Paid.is_paid());
        assert!(OrderStatus::Submitted.is_pending());
        assert!(OrderStatus::Preparing.is_pending());
        assert!(!OrderStatus::Served.is_pending());
        assert!(!OrderStatus::Paid.is_pending());
    }
}
