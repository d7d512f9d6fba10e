//! Money calculation utilities using rust_decimal for precision
//!
//! Rows store monetary values as `f64`; every calculation goes through
//! `Decimal` and is rounded back to 2 decimal places on the way out.

use rust_decimal::prelude::*;

use shared::order::CartLine;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a stored monetary value to 2 decimal places
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Line subtotal: unit price times quantity
pub fn line_subtotal(price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(price) * Decimal::from(quantity))
}

/// Sum subtotals, floored at zero
pub fn sum_subtotals<I>(subtotals: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let total: Decimal = subtotals.into_iter().map(to_decimal).sum();
    to_f64(total.max(Decimal::ZERO))
}

/// Total of a cart before submission
pub fn cart_total(lines: &[CartLine]) -> f64 {
    sum_subtotals(lines.iter().map(|l| line_subtotal(l.price, l.quantity)))
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_line(price: f64, quantity: i32) -> CartLine {
        CartLine {
            product_id: "p-1".to_string(),
            name: "Item".to_string(),
            category: "Mains".to_string(),
            price,
            quantity,
            note: String::new(),
        }
    }

    #[test]
    fn test_decimal_round_trip_beats_float_accumulation() {
        // 0.1 + 0.2 != 0.3 in f64, but does after the decimal round trip
        assert_ne!(0.1 + 0.2, 0.3);
        assert_eq!(to_f64(to_decimal(0.1) + to_decimal(0.2)), 0.3);
    }

    #[test]
    fn test_line_subtotal_rounds_half_up() {
        assert_eq!(line_subtotal(10.99, 3), 32.97);
        assert_eq!(line_subtotal(0.005, 1), 0.01);
    }

    #[test]
    fn test_sum_subtotals_floors_at_zero() {
        assert_eq!(sum_subtotals([12.5, -20.0]), 0.0);
        assert_eq!(sum_subtotals([0.01; 100]), 1.0);
    }

    #[test]
    fn test_cart_total() {
        let lines = vec![cart_line(8.5, 2), cart_line(3.25, 1)];
        assert_eq!(cart_total(&lines), 20.25);
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));
    }
}
