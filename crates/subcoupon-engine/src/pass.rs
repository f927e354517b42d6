//! # Totals Pass
//!
//! One run of the host's totals calculation over a cart.
//!
//! ## Pass Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            TotalsPass::run                              │
//! │                                                                         │
//! │  1. Sanity-check lines and coupons ─────────► EngineError (hard)        │
//! │                                                                         │
//! │  2. Validate each coupon against the cart ──► removed + CartRejection   │
//! │                                                                         │
//! │  3. RecurringTotal only: drop coupons that do not carry over            │
//! │                                                                         │
//! │  4. Aggregate renewal subtotals once                                   │
//! │                                                                         │
//! │  5. Price every (coupon, line) pair ────────► AppliedCoupon             │
//! │                                                                         │
//! │  PassOutcome is returned to the caller; nothing outlives the pass.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use subcoupon_core::validation::{validate_coupon, validate_line_item};
use subcoupon_core::{
    carries_into_recurring_total, validate_for_cart, CalculationPhase, CartContext, CartRejection,
    Coupon, CouponKind, DiscountCalculator, DiscountRequest, LineItem, Money, RenewalOrderRef,
    RenewalSubtotalResolver, RenewalSubtotals,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Core Discount Seam
// =============================================================================

/// The host's own discount logic for core coupon kinds.
///
/// Subscription kinds are priced by the calculator; core kinds
/// (`fixed_cart`, `percent`, `fixed_product`) are passed through untouched,
/// so the host says what they are worth.
pub trait CoreDiscount {
    fn core_discount(&self, coupon: &Coupon, line: &LineItem) -> Money;
}

/// Host without core coupon logic; core kinds discount nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCoreDiscount;

impl CoreDiscount for NoCoreDiscount {
    fn core_discount(&self, _coupon: &Coupon, _line: &LineItem) -> Money {
        Money::zero()
    }
}

impl<F> CoreDiscount for F
where
    F: Fn(&Coupon, &LineItem) -> Money,
{
    fn core_discount(&self, coupon: &Coupon, line: &LineItem) -> Money {
        self(coupon, line)
    }
}

// =============================================================================
// Input / Output
// =============================================================================

/// Snapshot of the cart handed to a pass.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    pub phase: CalculationPhase,
    pub cart: &'a CartContext,
    pub lines: &'a [LineItem],
    pub coupons: &'a [Coupon],
    pub renewal_orders: &'a [RenewalOrderRef],
}

/// A coupon the cart refused, with the message for the shopper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedCoupon {
    pub code: String,
    pub rejection: CartRejection,
}

impl RemovedCoupon {
    pub fn message(&self) -> String {
        self.rejection.to_string()
    }
}

/// A coupon that stayed on the cart and what it discounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub kind: CouponKind,

    /// Discount per line, in the order lines were given.
    pub line_discounts: Vec<Money>,
}

impl AppliedCoupon {
    pub fn total(&self) -> Money {
        self.line_discounts.iter().copied().sum()
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub pass_id: Uuid,
    pub phase: CalculationPhase,
    pub applied: Vec<AppliedCoupon>,
    pub removed: Vec<RemovedCoupon>,

    /// Codes left out of the recurring total because they do not recur.
    pub not_carried: Vec<String>,
}

impl PassOutcome {
    /// Sum of every applied coupon's discount.
    pub fn total_discount(&self) -> Money {
        self.applied.iter().map(AppliedCoupon::total).sum()
    }

    /// Discount of one applied coupon, if it stayed on the cart.
    pub fn discount_for(&self, code: &str) -> Option<Money> {
        self.applied
            .iter()
            .find(|applied| applied.code == code)
            .map(AppliedCoupon::total)
    }

    /// Shopper-facing messages for removed coupons.
    pub fn notices(&self) -> Vec<String> {
        self.removed.iter().map(RemovedCoupon::message).collect()
    }
}

// =============================================================================
// Totals Pass
// =============================================================================

/// Runs the coupon side of one totals calculation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalsPass {
    calculator: DiscountCalculator,
}

impl TotalsPass {
    pub fn new(calculator: DiscountCalculator) -> Self {
        TotalsPass { calculator }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        TotalsPass::new(config.calculator())
    }

    /// Runs the pass.
    ///
    /// Bad snapshots (zero quantities, negative prices, percent coupons over
    /// 100) are hard errors. Coupons the cart does not allow are soft: they
    /// come back in [`PassOutcome::removed`].
    pub fn run<C: CoreDiscount>(&self, input: &PassInput<'_>, core: &C) -> EngineResult<PassOutcome> {
        let pass_id = Uuid::new_v4();

        for (index, line) in input.lines.iter().enumerate() {
            validate_line_item(line).map_err(|source| EngineError::InvalidLine { index, source })?;
        }
        for coupon in input.coupons {
            validate_coupon(coupon)?;
        }

        let mut removed = Vec::new();
        let mut not_carried = Vec::new();
        let mut eligible = Vec::new();

        for coupon in input.coupons {
            if let Err(rejection) = validate_for_cart(coupon, input.cart) {
                removed.push(RemovedCoupon {
                    code: coupon.code.clone(),
                    rejection,
                });
                continue;
            }

            if input.phase == CalculationPhase::RecurringTotal && !carries_into_recurring_total(coupon) {
                not_carried.push(coupon.code.clone());
                continue;
            }

            eligible.push(coupon);
        }

        let subtotals = RenewalSubtotals::aggregate(input.lines, input.renewal_orders);

        let applied: Vec<AppliedCoupon> = eligible
            .into_iter()
            .map(|coupon| self.price_coupon(coupon, input, &subtotals, core))
            .collect();

        let outcome = PassOutcome {
            pass_id,
            phase: input.phase,
            applied,
            removed,
            not_carried,
        };

        info!(
            %pass_id,
            phase = %input.phase,
            applied = outcome.applied.len(),
            removed = outcome.removed.len(),
            discount = %outcome.total_discount(),
            "Totals pass complete"
        );

        Ok(outcome)
    }

    fn price_coupon<C: CoreDiscount>(
        &self,
        coupon: &Coupon,
        input: &PassInput<'_>,
        subtotals: &impl RenewalSubtotalResolver,
        core: &C,
    ) -> AppliedCoupon {
        let renewal_subtotal = match coupon.kind {
            CouponKind::RenewalCart => subtotals.renewal_subtotal(&coupon.code),
            _ => None,
        };

        let line_discounts: Vec<Money> = input
            .lines
            .iter()
            .map(|line| {
                let req = DiscountRequest::new(coupon, input.phase, line)
                    .renewal_subtotal(renewal_subtotal.as_ref())
                    .core_discount(core.core_discount(coupon, line));
                self.calculator.line_discount(&req)
            })
            .collect();

        debug!(code = %coupon.code, kind = %coupon.kind, ?line_discounts, "coupon priced");

        AppliedCoupon {
            code: coupon.code.clone(),
            kind: coupon.kind,
            line_discounts,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use subcoupon_core::{Rounding, RoundingMode};

    fn pass() -> TotalsPass {
        TotalsPass::new(DiscountCalculator::new(Rounding::new(2, RoundingMode::HalfUp)))
    }

    fn subscription_cart() -> CartContext {
        CartContext {
            contains_subscription: true,
            subtotal: Money::from_cents(5000),
            ..Default::default()
        }
    }

    #[test]
    fn test_recurring_fee_in_initial_total() {
        let cart = subscription_cart();
        let lines = vec![LineItem::new(Money::from_cents(2500), 2)];
        let coupons = vec![Coupon::new("TENOFF", CouponKind::RecurringFee, Decimal::from(10))];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap();

        assert_eq!(outcome.discount_for("TENOFF"), Some(Money::from_cents(2000)));
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_rejected_coupons_are_removed_softly() {
        let cart = subscription_cart();
        let lines = vec![LineItem::new(Money::from_cents(2500), 1)];
        let coupons = vec![
            Coupon::new("BACK", CouponKind::RenewalFee, Decimal::from(5)),
            Coupon::new("TENOFF", CouponKind::RecurringFee, Decimal::from(10)),
        ];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap();

        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].code, "BACK");
        assert_eq!(
            outcome.notices(),
            vec!["Sorry, the \"BACK\" coupon is only valid for renewals.".to_string()]
        );
        assert_eq!(outcome.discount_for("BACK"), None);
        assert_eq!(outcome.total_discount(), Money::from_cents(1000));
    }

    #[test]
    fn test_recurring_total_keeps_only_recurring_kinds() {
        let cart = CartContext {
            subscription_sign_up_fee_total: Money::from_cents(2000),
            ..subscription_cart()
        };
        let lines = vec![LineItem::new(Money::from_cents(2500), 1).with_sign_up_fee(Money::from_cents(2000))];
        let coupons = vec![
            Coupon::new("MONTHLY", CouponKind::RecurringPercent, Decimal::from(10)),
            Coupon::new("ONCE", CouponKind::RecurringFee, Decimal::from(5)).limited_to(1),
            Coupon::new("WELCOME", CouponKind::SignUpFee, Decimal::from(5)),
        ];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::RecurringTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.discount_for("MONTHLY"), Some(Money::from_cents(250)));
        assert_eq!(outcome.not_carried, vec!["ONCE".to_string(), "WELCOME".to_string()]);
    }

    #[test]
    fn test_renewal_cart_spread_across_its_order() {
        let cart = CartContext {
            contains_subscription: true,
            contains_renewal: true,
            subtotal: Money::from_cents(5000),
            ..Default::default()
        };
        let lines = vec![
            LineItem::new(Money::from_cents(1000), 1).renewal_of("812"),
            LineItem::new(Money::from_cents(2000), 2).renewal_of("812"),
        ];
        let coupons = vec![Coupon::new("LOYAL", CouponKind::RenewalCart, Decimal::from(10))];
        let orders = vec![RenewalOrderRef {
            order_id: "812".to_string(),
            coupon_codes: vec!["LOYAL".to_string()],
        }];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &orders,
                },
                &NoCoreDiscount,
            )
            .unwrap();

        let applied = &outcome.applied[0];
        assert_eq!(applied.line_discounts, vec![Money::from_cents(200), Money::from_cents(800)]);
        assert_eq!(applied.total(), Money::from_cents(1000));
    }

    #[test]
    fn test_renewal_cart_stays_on_its_own_renewal_order() {
        let cart = CartContext {
            contains_subscription: true,
            contains_renewal: true,
            subtotal: Money::from_cents(6000),
            ..Default::default()
        };
        let lines = vec![
            LineItem::new(Money::from_cents(1000), 1).renewal_of("812"),
            LineItem::new(Money::from_cents(5000), 1).renewal_of("813"),
        ];
        let coupons = vec![Coupon::new("LOYAL", CouponKind::RenewalCart, Decimal::from(10))];
        let orders = vec![
            RenewalOrderRef {
                order_id: "812".to_string(),
                coupon_codes: vec!["LOYAL".to_string()],
            },
            RenewalOrderRef {
                order_id: "813".to_string(),
                coupon_codes: vec![],
            },
        ];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &orders,
                },
                &NoCoreDiscount,
            )
            .unwrap();

        let applied = &outcome.applied[0];
        assert_eq!(applied.line_discounts, vec![Money::from_cents(1000), Money::zero()]);
        assert_eq!(outcome.total_discount(), Money::from_cents(1000));
    }

    #[test]
    fn test_core_kinds_use_host_discount() {
        let cart = CartContext {
            subtotal: Money::from_cents(1000),
            ..Default::default()
        };
        let lines = vec![LineItem::new(Money::from_cents(1000), 1)];
        let coupons = vec![Coupon::new("STORE", CouponKind::Percent, Decimal::from(15))];

        let host = |coupon: &Coupon, line: &LineItem| {
            line.line_subtotal().percentage(coupon.percent())
        };

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &host,
            )
            .unwrap();

        assert_eq!(outcome.discount_for("STORE"), Some(Money::from_cents(150)));
    }

    #[test]
    fn test_suppressed_phase_passes_through() {
        let cart = subscription_cart();
        let lines = vec![LineItem::new(Money::from_cents(2500), 1)];
        let coupons = vec![Coupon::new("TENOFF", CouponKind::RecurringFee, Decimal::from(10))];

        let outcome = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::Suppressed,
                    cart: &cart,
                    lines: &lines,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap();

        assert_eq!(outcome.total_discount(), Money::zero());
    }

    #[test]
    fn test_bad_snapshots_are_hard_errors() {
        let cart = subscription_cart();
        let coupons = vec![Coupon::new("TENOFF", CouponKind::RecurringFee, Decimal::from(10))];
        let zero_qty = vec![LineItem::new(Money::from_cents(2500), 0)];

        let err = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &zero_qty,
                    coupons: &coupons,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidLine { index: 0, .. }));

        let lines = vec![LineItem::new(Money::from_cents(2500), 1)];
        let greedy = vec![Coupon::new("ALL", CouponKind::RecurringPercent, Decimal::from(150))];
        let err = pass()
            .run(
                &PassInput {
                    phase: CalculationPhase::InitialTotal,
                    cart: &cart,
                    lines: &lines,
                    coupons: &greedy,
                    renewal_orders: &[],
                },
                &NoCoreDiscount,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }

    #[test]
    fn test_each_pass_gets_its_own_id() {
        let cart = subscription_cart();
        let input = PassInput {
            phase: CalculationPhase::InitialTotal,
            cart: &cart,
            lines: &[],
            coupons: &[],
            renewal_orders: &[],
        };

        let first = pass().run(&input, &NoCoreDiscount).unwrap();
        let second = pass().run(&input, &NoCoreDiscount).unwrap();
        assert_ne!(first.pass_id, second.pass_id);
        assert_eq!(first.applied, second.applied);
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = PassOutcome {
            pass_id: Uuid::nil(),
            phase: CalculationPhase::InitialTotal,
            applied: vec![],
            removed: vec![RemovedCoupon {
                code: "BACK".to_string(),
                rejection: CartRejection::RenewalsOnly {
                    code: "BACK".to_string(),
                },
            }],
            not_carried: vec![],
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["phase"], "initial_total");
        assert_eq!(json["removed"][0]["rejection"]["reason"], "renewals_only");
    }
}
