//! # Discount Calculator
//!
//! Works out how much a coupon takes off one line, given the phase of the
//! total being computed.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind group   │ InitialTotal                 │ RecurringTotal │ Supp.  │
//! │  ─────────────┼──────────────────────────────┼────────────────┼─────── │
//! │  core         │ core discount (untouched)    │ core discount  │ core   │
//! │  recurring    │ unit price, or 0 on trial    │ unit price     │ core   │
//! │  sign-up      │ sign-up fee if fee > 0       │ 0              │ core   │
//! │  renewal      │ unit price if renewal line   │ 0              │ core   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Formulas (A = coupon amount, B = per-unit discountable base)
//! ```text
//! fixed          min(A, B)            × quantity unless single_unit
//! percent        B × A / 100          B already × quantity unless single_unit
//! renewal_cart   A × (B × qty / renewal subtotal) / qty, only on lines of the
//!                renewal order the coupon came from
//! ```
//!
//! Everything is exact until the final [`Rounding`] step. Nothing in here
//! returns an error: a coupon that does not fit simply takes off zero.

use rust_decimal::Decimal;
use tracing::trace;

use crate::money::{Money, Rounding};
use crate::renewal::RenewalSubtotal;
use crate::taxonomy::{CouponKind, KindGroup};
use crate::types::{CalculationPhase, Coupon, LineItem};

// =============================================================================
// Request
// =============================================================================

/// Everything the calculator needs to price one coupon against one line.
#[derive(Debug, Clone, Copy)]
pub struct DiscountRequest<'a> {
    pub coupon: &'a Coupon,
    pub phase: CalculationPhase,
    pub line: &'a LineItem,

    /// Price a single unit rather than the whole line. Read by
    /// [`DiscountCalculator::compute`] only; [`DiscountCalculator::line_discount`]
    /// always prices the whole line.
    pub single_unit: bool,

    /// Originating renewal order of this coupon's code and its subtotal;
    /// only `renewal_cart` reads it.
    pub renewal_subtotal: Option<&'a RenewalSubtotal>,

    /// Discount the host's own (non-subscription) coupon logic produced.
    /// Returned untouched whenever subscription logic does not apply.
    pub core_discount: Money,
}

impl<'a> DiscountRequest<'a> {
    pub fn new(coupon: &'a Coupon, phase: CalculationPhase, line: &'a LineItem) -> Self {
        DiscountRequest {
            coupon,
            phase,
            line,
            single_unit: false,
            renewal_subtotal: None,
            core_discount: Money::zero(),
        }
    }

    pub fn single_unit(mut self, single: bool) -> Self {
        self.single_unit = single;
        self
    }

    pub fn renewal_subtotal(mut self, subtotal: Option<&'a RenewalSubtotal>) -> Self {
        self.renewal_subtotal = subtotal;
        self
    }

    pub fn core_discount(mut self, discount: Money) -> Self {
        self.core_discount = discount;
        self
    }
}

/// Exact result before rounding.
enum RawDiscount {
    /// Subscription logic does not run; hand back the core discount.
    PassThrough,
    Amount(Money),
}

// =============================================================================
// Calculator
// =============================================================================

/// Pure discount calculator bound to the host's rounding policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountCalculator {
    rounding: Rounding,
}

impl DiscountCalculator {
    pub const fn new(rounding: Rounding) -> Self {
        DiscountCalculator { rounding }
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Discount for the request, rounded.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use subcoupon_core::calculator::{DiscountCalculator, DiscountRequest};
    /// use subcoupon_core::money::{Money, Rounding};
    /// use subcoupon_core::taxonomy::CouponKind;
    /// use subcoupon_core::types::{CalculationPhase, Coupon, LineItem};
    ///
    /// let coupon = Coupon::new("TENOFF", CouponKind::RecurringFee, Decimal::from(10));
    /// let line = LineItem::new(Money::from_cents(2500), 2);
    ///
    /// let calc = DiscountCalculator::new(Rounding::default());
    /// let req = DiscountRequest::new(&coupon, CalculationPhase::RecurringTotal, &line);
    /// assert_eq!(calc.compute(&req), Money::from_cents(2000));
    /// ```
    pub fn compute(&self, req: &DiscountRequest<'_>) -> Money {
        let discount = match raw_discount(req) {
            RawDiscount::PassThrough => req.core_discount,
            RawDiscount::Amount(raw) => raw.round(self.rounding),
        };

        trace!(
            code = %req.coupon.code,
            kind = %req.coupon.kind,
            phase = %req.phase,
            single_unit = req.single_unit,
            %discount,
            "coupon discount computed"
        );

        discount
    }

    /// Discount for the whole line, rounded once.
    ///
    /// `req.single_unit` is ignored: every kind is priced as if it were
    /// `false`. `renewal_cart` yields a per-unit value by construction, so it
    /// is scaled back up by the quantity here.
    pub fn line_discount(&self, req: &DiscountRequest<'_>) -> Money {
        let req = DiscountRequest {
            single_unit: false,
            ..*req
        };

        match raw_discount(&req) {
            RawDiscount::PassThrough => req.core_discount,
            RawDiscount::Amount(raw) if req.coupon.kind == CouponKind::RenewalCart => raw
                .multiply_quantity(req.line.quantity)
                .round(self.rounding),
            RawDiscount::Amount(raw) => raw.round(self.rounding),
        }
    }
}

/// Free-function form of [`DiscountCalculator::compute`].
pub fn compute_discount(req: &DiscountRequest<'_>, rounding: Rounding) -> Money {
    DiscountCalculator::new(rounding).compute(req)
}

// =============================================================================
// Internals
// =============================================================================

fn raw_discount(req: &DiscountRequest<'_>) -> RawDiscount {
    if req.phase == CalculationPhase::Suppressed {
        return RawDiscount::PassThrough;
    }

    let coupon = req.coupon;
    let line = req.line;

    let amount = match coupon.kind {
        CouponKind::FixedCart | CouponKind::Percent | CouponKind::FixedProduct => {
            return RawDiscount::PassThrough;
        }
        CouponKind::RecurringFee | CouponKind::SignUpFee | CouponKind::RenewalFee => {
            discountable_base(coupon.kind, req.phase, line)
                .map(|base| fixed_discount(coupon.fixed_amount(), base, line.quantity, req.single_unit))
        }
        CouponKind::RecurringPercent | CouponKind::SignUpFeePercent | CouponKind::RenewalPercent => {
            discountable_base(coupon.kind, req.phase, line).map(|base| {
                let base = if req.single_unit {
                    base
                } else {
                    base.multiply_quantity(line.quantity)
                };
                base.percentage(coupon.percent())
            })
        }
        CouponKind::RenewalCart => discountable_base(coupon.kind, req.phase, line).and_then(|base| {
            renewal_cart_share(coupon.fixed_amount(), base, line, req.renewal_subtotal)
        }),
    };

    RawDiscount::Amount(amount.unwrap_or_else(Money::zero))
}

/// Per-unit amount a subscription kind may discount on this line in this
/// phase, or `None` when the kind does not apply at all.
fn discountable_base(kind: CouponKind, phase: CalculationPhase, line: &LineItem) -> Option<Money> {
    match (kind.group(), phase) {
        (KindGroup::Core, _) | (_, CalculationPhase::Suppressed) => None,

        (KindGroup::Recurring, CalculationPhase::RecurringTotal) => Some(line.unit_price),
        // nothing recurring is due today while the trial runs
        (KindGroup::Recurring, CalculationPhase::InitialTotal) if line.has_free_trial() => {
            Some(Money::zero())
        }
        (KindGroup::Recurring, CalculationPhase::InitialTotal) => Some(line.unit_price),

        (KindGroup::SignUp, CalculationPhase::InitialTotal) if line.has_sign_up_fee() => {
            Some(line.sign_up_fee)
        }
        (KindGroup::SignUp, _) => None,

        (KindGroup::Renewal, CalculationPhase::InitialTotal) if line.is_renewal_line => {
            Some(line.unit_price)
        }
        (KindGroup::Renewal, _) => None,
    }
}

fn fixed_discount(amount: Money, base: Money, quantity: u32, single_unit: bool) -> Money {
    let per_unit = amount.max(Money::zero()).min(base);
    if single_unit {
        per_unit
    } else {
        per_unit.multiply_quantity(quantity)
    }
}

/// The line's proportional slice of a fixed renewal coupon, per unit.
///
/// Lines of any other renewal order get nothing.
fn renewal_cart_share(
    amount: Money,
    base: Money,
    line: &LineItem,
    renewal_subtotal: Option<&RenewalSubtotal>,
) -> Option<Money> {
    let subtotal = renewal_subtotal.filter(|s| s.amount.is_positive())?;
    if line.renewal_order_id.as_deref() != Some(subtotal.order_id.as_str()) || line.quantity == 0 {
        return None;
    }

    let qty = Decimal::from(line.quantity);
    let share = (base.amount() * qty).checked_div(subtotal.amount.amount())?;
    let per_unit = (amount.amount() * share).checked_div(qty)?;

    Some(Money::from_decimal(per_unit))
}

// =============================================================================
// Unit Tests
// =============================================================================
