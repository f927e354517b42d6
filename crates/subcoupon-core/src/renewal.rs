//! # Renewal Subtotals
//!
//! Aggregates the renewal lines a `renewal_cart` coupon is spread across.
//!
//! A renewal cart coupon is a fixed amount split over the lines of one
//! renewal order in proportion to their value. Each line's share needs the
//! total of all those lines, so the total is computed up front, once per
//! pass, and then handed to the calculator for every line.
//!
//! ```text
//! renewal order #812 (coupon LOYAL)        renewal order #813 (coupon VIP)
//!   line A  $10 × 1  ─┐                      line C  $50 × 1 ─┐
//!   line B  $20 × 2  ─┴─► LOYAL: $50           ...            ─┴─► VIP: $50
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::LineItem;

/// The renewal order a `renewal_cart` coupon came from, and the value of
/// its lines in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalSubtotal {
    pub order_id: String,
    pub amount: Money,
}

impl RenewalSubtotal {
    pub fn new(order_id: impl Into<String>, amount: Money) -> Self {
        RenewalSubtotal {
            order_id: order_id.into(),
            amount,
        }
    }
}

/// Supplies the renewal subtotal a `renewal_cart` coupon is spread over.
pub trait RenewalSubtotalResolver {
    /// Originating renewal order of `code` with the sum of its renewal-line
    /// prices, or `None` when no such lines exist.
    fn renewal_subtotal(&self, code: &str) -> Option<RenewalSubtotal>;
}

/// A renewal order in the cart and the coupon codes recorded on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalOrderRef {
    pub order_id: String,
    pub coupon_codes: Vec<String>,
}

/// Precomputed renewal subtotals keyed by coupon code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenewalSubtotals {
    by_code: HashMap<String, RenewalSubtotal>,
}

impl RenewalSubtotals {
    /// Builds the per-code subtotals for one pass.
    ///
    /// A code belongs to the first order in `orders` that carries it; later
    /// orders with the same code are ignored. Lines that are not renewal
    /// lines, or that point at another order, do not count.
    pub fn aggregate(lines: &[LineItem], orders: &[RenewalOrderRef]) -> Self {
        let mut by_code: HashMap<String, RenewalSubtotal> = HashMap::new();

        for order in orders {
            let order_total: Money = lines
                .iter()
                .filter(|line| {
                    line.is_renewal_line
                        && line.renewal_order_id.as_deref() == Some(order.order_id.as_str())
                })
                .map(LineItem::line_subtotal)
                .sum();

            for code in &order.coupon_codes {
                by_code
                    .entry(code.clone())
                    .or_insert_with(|| RenewalSubtotal::new(order.order_id.clone(), order_total));
            }
        }

        RenewalSubtotals { by_code }
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl RenewalSubtotalResolver for RenewalSubtotals {
    fn renewal_subtotal(&self, code: &str) -> Option<RenewalSubtotal> {
        self.by_code
            .get(code)
            .filter(|subtotal| subtotal.amount.is_positive())
            .cloned()
    }
}

impl<F> RenewalSubtotalResolver for F
where
    F: Fn(&str) -> Option<RenewalSubtotal>,
{
    fn renewal_subtotal(&self, code: &str) -> Option<RenewalSubtotal> {
        self(code)
    }
}
