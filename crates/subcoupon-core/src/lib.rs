//! # subcoupon-core: Subscription Coupon Rules
//!
//! Pure discount and eligibility logic for coupons on subscription products.
//! Nothing in here touches a database, the network or the clock; the host
//! hands in snapshots and gets values back.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Host commerce platform                          │
//! │        cart totals ──► checkout ──► renewal payment ──► order notes     │
//! └────────────────────────────────┬────────────────────────────────────────┘
//!                                  │ snapshots in, values out
//! ┌────────────────────────────────▼────────────────────────────────────────┐
//! │                   subcoupon-engine (config, passes)                     │
//! │          TotalsPass            CouponRetirer           EngineConfig     │
//! └────────────────────────────────┬────────────────────────────────────────┘
//!                                  │
//! ┌────────────────────────────────▼────────────────────────────────────────┐
//! │                  ★ subcoupon-core (THIS CRATE) ★                        │
//! │                                                                         │
//! │   ┌───────────┐  ┌────────────┐  ┌─────────────┐  ┌─────────────┐      │
//! │   │ taxonomy  │  │ calculator │  │ eligibility │  │ limited_use │      │
//! │   │CouponKind │  │  discount  │  │ cart/order  │  │ usage count │      │
//! │   └───────────┘  └────────────┘  └─────────────┘  └─────────────┘      │
//! │   ┌───────────┐  ┌────────────┐  ┌─────────────┐  ┌─────────────┐      │
//! │   │   money   │  │   types    │  │ repository  │  │   renewal   │      │
//! │   │ Rounding  │  │ LineItem   │  │  read_raw   │  │  subtotals  │      │
//! │   └───────────┘  └────────────┘  └─────────────┘  └─────────────┘      │
//! │                                                                         │
//! │          NO I/O • NO GLOBAL STATE • SAME INPUT, SAME OUTPUT             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`taxonomy`] - Coupon kinds and their groups
//! - [`money`] - Decimal money and configurable rounding
//! - [`types`] - Line items, coupons and cart/order snapshots
//! - [`calculator`] - Per-line discount amounts
//! - [`eligibility`] - Cart and order validation
//! - [`limited_use`] - Usage counting and retirement decisions
//! - [`renewal`] - Renewal subtotals for `renewal_cart` coupons
//! - [`repository`] - Coupon lookup seam
//! - [`validation`] - Input sanity checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use subcoupon_core::{
//!     CalculationPhase, Coupon, CouponKind, DiscountCalculator, DiscountRequest, LineItem, Money,
//! };
//!
//! let coupon = Coupon::new("SAVE10", CouponKind::RecurringFee, Decimal::from(10));
//! let line = LineItem::new(Money::from_cents(2500), 2);
//!
//! let calculator = DiscountCalculator::default();
//! let discount = calculator.compute(&DiscountRequest::new(
//!     &coupon,
//!     CalculationPhase::RecurringTotal,
//!     &line,
//! ));
//!
//! // min(10, 25) per unit, two units
//! assert_eq!(discount, Money::from_cents(2000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod eligibility;
pub mod error;
pub mod limited_use;
pub mod money;
pub mod renewal;
pub mod repository;
pub mod taxonomy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{compute_discount, DiscountCalculator, DiscountRequest};
pub use eligibility::{
    carries_into_recurring_total, validate, validate_for_cart, validate_for_order, CartRejection,
    CouponRejection, EligibilityContext, OrderRejection,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use limited_use::{decide_retirement, remaining_payments, UsageTracker};
pub use money::{Money, Rounding, RoundingMode};
pub use renewal::{RenewalOrderRef, RenewalSubtotal, RenewalSubtotalResolver, RenewalSubtotals};
pub use repository::{CouponRepository, InMemoryCouponRepository};
pub use taxonomy::{CouponKind, KindGroup};
pub use types::*;
