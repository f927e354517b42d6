//! # Limited-Use Tracking
//!
//! Counts how many payments a limited coupon has really discounted, and
//! decides when it has run out.
//!
//! ## What Counts as a Use
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every related order (parent + renewals) and every limited code:   │
//! │                                                                         │
//! │   order still needs payment?          ── yes ──► skip                  │
//! │   order fully refunded?               ── yes ──► skip                  │
//! │   order discount total is zero?       ── yes ──► skip                  │
//! │   this coupon's discount is zero?     ── yes ──► skip                  │
//! │                                         no                              │
//! │                                          └──────► count += 1            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Fully refunded" is an equality check between the order total and the
//! refunded total, loosened by a small epsilon so formatting drift in the
//! host's numbers does not change the outcome.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::trace;

use crate::money::Money;
use crate::repository::CouponRepository;
use crate::types::{Coupon, RelatedOrder};

/// Default tolerance for the fully-refunded comparison (half a cent).
pub const DEFAULT_REFUND_EPSILON: Money = Money::from_decimal(Decimal::from_parts(5, 0, 0, false, 3)); // 0.005

/// Counts coupon uses across a subscription's related orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageTracker {
    refund_epsilon: Money,
}

impl Default for UsageTracker {
    fn default() -> Self {
        UsageTracker::new(DEFAULT_REFUND_EPSILON)
    }
}

impl UsageTracker {
    pub const fn new(refund_epsilon: Money) -> Self {
        UsageTracker { refund_epsilon }
    }

    pub fn refund_epsilon(&self) -> Money {
        self.refund_epsilon
    }

    /// Whether the order's whole total has been refunded.
    pub fn is_fully_refunded(&self, order: &RelatedOrder) -> bool {
        match order.total_refunded {
            Some(refunded) => order.total.approx_eq(refunded, self.refund_epsilon),
            None => false,
        }
    }

    /// Whether the order can count towards any coupon's usage.
    fn order_counts(&self, order: &RelatedOrder) -> bool {
        !order.needs_payment && !self.is_fully_refunded(order) && !order.discount_total.is_zero()
    }

    /// Number of uses for each code in `limited_codes`.
    ///
    /// Every requested code appears in the result, with zero when unused.
    ///
    /// ```rust
    /// use std::collections::HashSet;
    /// use subcoupon_core::limited_use::UsageTracker;
    /// use subcoupon_core::money::Money;
    /// use subcoupon_core::types::{CouponLine, RelatedOrder};
    ///
    /// let paid = RelatedOrder {
    ///     id: "1".into(),
    ///     needs_payment: false,
    ///     total: Money::from_cents(900),
    ///     total_refunded: None,
    ///     discount_total: Money::from_cents(100),
    ///     coupons: vec![CouponLine { code: "LOYAL".into(), discount: Money::from_cents(100) }],
    /// };
    /// let codes: HashSet<String> = ["LOYAL".to_string()].into();
    ///
    /// let usage = UsageTracker::default().compute_usage(&[paid], &codes);
    /// assert_eq!(usage["LOYAL"], 1);
    /// ```
    pub fn compute_usage(
        &self,
        history: &[RelatedOrder],
        limited_codes: &HashSet<String>,
    ) -> HashMap<String, u32> {
        let mut usage: HashMap<String, u32> =
            limited_codes.iter().map(|code| (code.clone(), 0)).collect();

        for order in history.iter().filter(|order| self.order_counts(order)) {
            for code in limited_codes {
                if order.discount_for(code).is_zero() {
                    continue;
                }
                if let Some(count) = usage.get_mut(code) {
                    *count += 1;
                }
            }
        }

        trace!(orders = history.len(), ?usage, "coupon usage computed");
        usage
    }
}

/// Free-function form of [`UsageTracker::compute_usage`] with the default
/// refund tolerance.
pub fn compute_usage(
    history: &[RelatedOrder],
    limited_codes: &HashSet<String>,
) -> HashMap<String, u32> {
    UsageTracker::default().compute_usage(history, limited_codes)
}

/// True once a limited coupon has been used as often as it may be.
///
/// A limit of zero means unlimited and never retires.
#[inline]
pub fn decide_retirement(count: u32, limit: u32) -> bool {
    limit != 0 && count >= limit
}

/// Payments left before retirement; `None` for unlimited coupons.
pub fn remaining_payments(count: u32, limit: u32) -> Option<u32> {
    if limit == 0 {
        return None;
    }
    Some(limit.saturating_sub(count))
}

/// Usage limit for an applied coupon, read from the stored record.
///
/// Renewal kinds are virtual, so their record is read raw; otherwise the
/// repository's normal view is used. When the repository does not know the
/// code, the applied coupon's own limit is used.
pub fn stored_usage_limit<R: CouponRepository>(repo: &R, applied: &Coupon) -> u32 {
    let stored = if applied.kind.is_renewal() {
        repo.read_raw(&applied.code)
    } else {
        repo.read(&applied.code)
    };

    stored
        .map(|coupon| coupon.usage_limit_payments)
        .unwrap_or(applied.usage_limit_payments)
}

/// The applied coupons that carry a usage limit, keyed by code.
///
/// Unlimited coupons are left out entirely.
pub fn limited_codes_for<R: CouponRepository>(repo: &R, applied: &[Coupon]) -> HashMap<String, u32> {
    applied
        .iter()
        .filter_map(|coupon| {
            let limit = stored_usage_limit(repo, coupon);
            (limit > 0).then(|| (coupon.code.clone(), limit))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
