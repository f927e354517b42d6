//! # Domain Types
//!
//! Snapshot types handed to the core by the host.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Coupon       │   │    LineItem     │   │ CalculationPhase│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code           │   │  unit_price     │   │  InitialTotal   │       │
//! │  │  kind           │   │  quantity       │   │  RecurringTotal │       │
//! │  │  amount         │   │  sign_up_fee    │   │  Suppressed     │       │
//! │  │  usage_limit    │   │  trial / renewal│   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CartContext    │   │  OrderContext   │   │  RelatedOrder   │       │
//! │  │  (cart facts)   │   │  (order facts)  │   │  (usage history)│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core never mutates any of these. The host builds them fresh for each
//! totals pass and applies whatever discounts come back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::taxonomy::CouponKind;

// =============================================================================
// Percent
// =============================================================================

/// A percentage expressed in whole percent units (`15.5` = 15.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Percent(value)
    }

    #[inline]
    pub fn from_whole(value: u32) -> Self {
        Percent(Decimal::from(value))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

// =============================================================================
// Calculation Phase
// =============================================================================

/// Which total the host is computing right now.
///
/// ```text
/// InitialTotal    what is due today: sign-up fee + first period (unless trial)
/// RecurringTotal  what will be charged each future period
/// Suppressed      cart has no subscription content; core coupon logic only
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationPhase {
    InitialTotal,
    RecurringTotal,
    Suppressed,
}

impl std::fmt::Display for CalculationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationPhase::InitialTotal => write!(f, "initial_total"),
            CalculationPhase::RecurringTotal => write!(f, "recurring_total"),
            CalculationPhase::Suppressed => write!(f, "suppressed"),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One sellable line of a cart or renewal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Recurring price of one unit.
    pub unit_price: Money,

    /// Units on the line (at least 1).
    pub quantity: u32,

    /// One-off sign-up fee per unit.
    #[serde(default)]
    pub sign_up_fee: Money,

    /// Length of the free trial, zero for none.
    #[serde(default)]
    pub trial_length_days: u32,

    /// Set when the customer already used up the trial (e.g. resubscribing).
    #[serde(default)]
    pub trial_consumed: bool,

    /// Whether the line belongs to a renewal payment.
    #[serde(default)]
    pub is_renewal_line: bool,

    /// Renewal order the line was created from.
    #[serde(default)]
    pub renewal_order_id: Option<String>,
}

impl LineItem {
    /// A plain subscription line with no fee, trial or renewal link.
    pub fn new(unit_price: Money, quantity: u32) -> Self {
        LineItem {
            unit_price,
            quantity,
            sign_up_fee: Money::zero(),
            trial_length_days: 0,
            trial_consumed: false,
            is_renewal_line: false,
            renewal_order_id: None,
        }
    }

    pub fn with_sign_up_fee(mut self, fee: Money) -> Self {
        self.sign_up_fee = fee;
        self
    }

    pub fn with_trial_days(mut self, days: u32) -> Self {
        self.trial_length_days = days;
        self
    }

    /// Marks the line as part of the renewal order `order_id`.
    pub fn renewal_of(mut self, order_id: impl Into<String>) -> Self {
        self.is_renewal_line = true;
        self.renewal_order_id = Some(order_id.into());
        self
    }

    #[inline]
    pub fn has_free_trial(&self) -> bool {
        self.trial_length_days > 0 && !self.trial_consumed
    }

    #[inline]
    pub fn has_sign_up_fee(&self) -> bool {
        self.sign_up_fee.is_positive()
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// Read-only view of a coupon record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,

    /// Money for fixed kinds, whole percent for percent kinds.
    pub amount: Decimal,

    /// Number of payments (the first included) the coupon may discount.
    /// Zero means unlimited.
    #[serde(default)]
    pub usage_limit_payments: u32,
}

impl Coupon {
    pub fn new(code: impl Into<String>, kind: CouponKind, amount: Decimal) -> Self {
        Coupon {
            code: code.into(),
            kind,
            amount,
            usage_limit_payments: 0,
        }
    }

    pub fn limited_to(mut self, payments: u32) -> Self {
        self.usage_limit_payments = payments;
        self
    }

    /// Same coupon re-applied under a different (usually virtual) kind.
    pub fn as_kind(&self, kind: CouponKind) -> Coupon {
        Coupon {
            kind,
            ..self.clone()
        }
    }

    #[inline]
    pub fn fixed_amount(&self) -> Money {
        Money::from_decimal(self.amount)
    }

    #[inline]
    pub fn percent(&self) -> Percent {
        Percent::new(self.amount)
    }

    #[inline]
    pub fn is_limited(&self) -> bool {
        self.usage_limit_payments > 0
    }
}

// =============================================================================
// Cart / Order Contexts
// =============================================================================

/// Aggregate facts about the cart being totaled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartContext {
    pub contains_subscription: bool,
    pub contains_renewal: bool,
    pub subscription_sign_up_fee_total: Money,
    pub subtotal: Money,
}

/// Which orders count when asking whether an order contains a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRelation {
    /// The order is linked to a subscription in any way (parent, renewal, ...).
    Any,
    /// The order is the parent (first) order of a subscription.
    Parent,
}

/// Facts about an order or subscription a coupon is being applied to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderContext {
    /// The target is a subscription itself, not an order.
    pub is_subscription: bool,
    pub contains_subscription_any: bool,
    pub contains_subscription_parent: bool,
    pub sign_up_fee_total: Money,
}

impl OrderContext {
    pub fn contains_subscription(&self, relation: OrderRelation) -> bool {
        match relation {
            OrderRelation::Any => self.contains_subscription_any,
            OrderRelation::Parent => self.contains_subscription_parent,
        }
    }
}

// =============================================================================
// Order History
// =============================================================================

/// Discount a single coupon contributed to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponLine {
    pub code: String,
    pub discount: Money,
}

/// One order related to a subscription (parent or renewal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedOrder {
    pub id: String,
    pub needs_payment: bool,
    pub total: Money,
    #[serde(default)]
    pub total_refunded: Option<Money>,
    pub discount_total: Money,
    #[serde(default)]
    pub coupons: Vec<CouponLine>,
}

impl RelatedOrder {
    /// Discount recorded for `code` on this order, zero when absent.
    pub fn discount_for(&self, code: &str) -> Money {
        self.coupons
            .iter()
            .filter(|line| line.code == code)
            .map(|line| line.discount)
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
