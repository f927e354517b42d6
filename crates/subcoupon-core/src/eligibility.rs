//! # Coupon Eligibility
//!
//! Decides whether a coupon may apply to a cart or to an order/subscription.
//!
//! ## Two Tiers of Rejection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CART (customer checkout)               ORDER (admin applies coupon)    │
//! │  ────────────────────────               ────────────────────────────    │
//! │  CartRejection                          OrderRejection                  │
//! │  • soft: coupon is dropped              • hard: action is aborted       │
//! │  • message shown to the shopper         • converts into CoreError       │
//! │  • totals pass carries on               • host must surface it          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules run in a fixed order and only the first failure is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::taxonomy::KindGroup;
use crate::types::{CartContext, Coupon, OrderContext, OrderRelation};

// =============================================================================
// Rejections
// =============================================================================

/// Why a coupon cannot apply to the current cart. Shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CartRejection {
    #[error("Sorry, this coupon is only valid for an initial payment and the cart does not require an initial payment.")]
    InitialPaymentNotRequired,

    #[error("Sorry, this coupon is only valid for new subscriptions.")]
    NewSubscriptionsOnly,

    #[error("Sorry, this coupon is only valid for subscription products.")]
    SubscriptionProductsOnly,

    #[error("Sorry, the \"{code}\" coupon is only valid for renewals.")]
    RenewalsOnly { code: String },

    #[error("Sorry, this coupon is only valid for subscription products with a sign-up fee.")]
    SignUpFeeRequired,
}

/// Why a coupon cannot be applied to an order or subscription. Fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OrderRejection {
    #[error("You can only apply recurring coupons to subscriptions or subscription orders.")]
    RecurringNeedsSubscription,

    #[error("You can only apply the sign-up fee coupon \"{code}\" to a subscription's parent order or an order with a sign-up fee.")]
    SignUpFeeNotApplicable { code: String },

    #[error("You can only apply recurring coupons to subscriptions.")]
    OnlyRecurringOnSubscriptions,
}

/// Either tier of rejection, for callers validating through [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error(transparent)]
    Cart(#[from] CartRejection),

    #[error(transparent)]
    Order(#[from] OrderRejection),
}

impl CouponRejection {
    /// Order-tier rejections must abort the action that triggered them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CouponRejection::Order(_))
    }

    /// Escalates a fatal rejection into a [`CoreError`]; soft ones come back
    /// as `Ok` so the caller can drop the coupon and move on.
    pub fn into_fatal(self) -> CoreResult<CartRejection> {
        match self {
            CouponRejection::Cart(soft) => Ok(soft),
            CouponRejection::Order(hard) => Err(CoreError::from(hard)),
        }
    }
}

// =============================================================================
// Contexts
// =============================================================================

/// What the coupon is being validated against.
#[derive(Debug, Clone, Copy)]
pub enum EligibilityContext<'a> {
    Cart(&'a CartContext),
    Order(&'a OrderContext),
}

/// Validates a coupon against a cart or an order.
///
/// ```rust
/// use rust_decimal::Decimal;
/// use subcoupon_core::eligibility::{validate, EligibilityContext};
/// use subcoupon_core::taxonomy::CouponKind;
/// use subcoupon_core::types::{CartContext, Coupon};
///
/// let coupon = Coupon::new("BACK", CouponKind::RenewalFee, Decimal::from(5));
/// let cart = CartContext { contains_subscription: true, ..Default::default() };
///
/// let err = validate(&coupon, EligibilityContext::Cart(&cart)).unwrap_err();
/// assert!(!err.is_fatal());
/// assert!(err.to_string().contains("\"BACK\""));
/// ```
pub fn validate(coupon: &Coupon, context: EligibilityContext<'_>) -> Result<(), CouponRejection> {
    match context {
        EligibilityContext::Cart(cart) => validate_for_cart(coupon, cart).map_err(Into::into),
        EligibilityContext::Order(order) => validate_for_order(coupon, order).map_err(Into::into),
    }
}

// =============================================================================
// Cart Rules
// =============================================================================

/// Cart-tier rules.
///
/// ## Rule Order
/// ```text
/// core kind
///   └─ cart has subscription/renewal but nothing to pay ─► InitialPaymentNotRequired
/// subscription kind
///   ├─ renewal cart, kind not a renewal kind ─────────────► NewSubscriptionsOnly
///   ├─ neither renewal nor subscription in cart ──────────► SubscriptionProductsOnly
///   ├─ no renewal, renewal kind ──────────────────────────► RenewalsOnly { code }
///   └─ no sign-up fees, sign-up kind ─────────────────────► SignUpFeeRequired
/// ```
pub fn validate_for_cart(coupon: &Coupon, cart: &CartContext) -> Result<(), CartRejection> {
    let result = cart_rule(coupon, cart);

    if let Err(rejection) = &result {
        debug!(code = %coupon.code, kind = %coupon.kind, ?rejection, "coupon rejected for cart");
    }

    result
}

fn cart_rule(coupon: &Coupon, cart: &CartContext) -> Result<(), CartRejection> {
    let group = coupon.kind.group();

    if group == KindGroup::Core {
        if (cart.contains_renewal || cart.contains_subscription) && cart.subtotal.is_zero() {
            return Err(CartRejection::InitialPaymentNotRequired);
        }
        return Ok(());
    }

    let is_renewal_kind = group == KindGroup::Renewal;

    if cart.contains_renewal && !is_renewal_kind {
        return Err(CartRejection::NewSubscriptionsOnly);
    }

    if !cart.contains_renewal && !cart.contains_subscription {
        return Err(CartRejection::SubscriptionProductsOnly);
    }

    if !cart.contains_renewal && is_renewal_kind {
        return Err(CartRejection::RenewalsOnly {
            code: coupon.code.clone(),
        });
    }

    if group == KindGroup::SignUp && cart.subscription_sign_up_fee_total.is_zero() {
        return Err(CartRejection::SignUpFeeRequired);
    }

    Ok(())
}

// =============================================================================
// Order Rules
// =============================================================================

/// Order-tier rules. Any rejection here is fatal for the apply action.
pub fn validate_for_order(coupon: &Coupon, order: &OrderContext) -> Result<(), OrderRejection> {
    let group = coupon.kind.group();

    let result = if group == KindGroup::Recurring
        && !(order.is_subscription || order.contains_subscription(OrderRelation::Any))
    {
        Err(OrderRejection::RecurringNeedsSubscription)
    } else if group == KindGroup::SignUp
        && !(order.contains_subscription(OrderRelation::Parent) || !order.sign_up_fee_total.is_zero())
    {
        Err(OrderRejection::SignUpFeeNotApplicable {
            code: coupon.code.clone(),
        })
    } else if group != KindGroup::Recurring && order.is_subscription {
        Err(OrderRejection::OnlyRecurringOnSubscriptions)
    } else {
        Ok(())
    };

    if let Err(rejection) = &result {
        debug!(code = %coupon.code, kind = %coupon.kind, ?rejection, "coupon rejected for order");
    }

    result
}

/// [`validate_for_order`] with the rejection escalated to [`CoreError`].
pub fn ensure_applicable_to_order(coupon: &Coupon, order: &OrderContext) -> CoreResult<()> {
    validate_for_order(coupon, order)?;
    Ok(())
}

// =============================================================================
// Recurring Carry-Over
// =============================================================================

/// Whether a coupon applied at checkout also discounts the recurring total.
///
/// Only recurring kinds carry over, and a recurring coupon limited to a
/// single payment is spent on the initial payment.
pub fn carries_into_recurring_total(coupon: &Coupon) -> bool {
    coupon.kind.is_recurring() && coupon.usage_limit_payments != 1
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::taxonomy::CouponKind;
    use rust_decimal::Decimal;

    fn coupon(kind: CouponKind) -> Coupon {
        Coupon::new("PROMO", kind, Decimal::from(5))
    }

    fn subscription_cart() -> CartContext {
        CartContext {
            contains_subscription: true,
            contains_renewal: false,
            subscription_sign_up_fee_total: Money::from_cents(1000),
            subtotal: Money::from_cents(5000),
        }
    }

    fn renewal_cart() -> CartContext {
        CartContext {
            contains_subscription: false,
            contains_renewal: true,
            subscription_sign_up_fee_total: Money::zero(),
            subtotal: Money::from_cents(3000),
        }
    }

    #[test]
    fn test_core_kinds_in_cart() {
        let c = coupon(CouponKind::Percent);
        assert!(validate_for_cart(&c, &subscription_cart()).is_ok());
        assert!(validate_for_cart(&c, &CartContext::default()).is_ok());

        let free = CartContext {
            subtotal: Money::zero(),
            ..subscription_cart()
        };
        assert_eq!(
            validate_for_cart(&c, &free),
            Err(CartRejection::InitialPaymentNotRequired)
        );

        // a plain cart with nothing to pay is not our business
        let empty_plain = CartContext::default();
        assert!(validate_for_cart(&c, &empty_plain).is_ok());
    }

    #[test]
    fn test_renewal_cart_only_accepts_renewal_kinds() {
        let cart = renewal_cart();
        assert_eq!(
            validate_for_cart(&coupon(CouponKind::RecurringFee), &cart),
            Err(CartRejection::NewSubscriptionsOnly)
        );
        assert_eq!(
            validate_for_cart(&coupon(CouponKind::SignUpFee), &cart),
            Err(CartRejection::NewSubscriptionsOnly)
        );
        for kind in [CouponKind::RenewalFee, CouponKind::RenewalPercent, CouponKind::RenewalCart] {
            assert!(validate_for_cart(&coupon(kind), &cart).is_ok(), "{kind}");
        }
    }

    #[test]
    fn test_subscription_kinds_need_subscription_products() {
        let plain = CartContext {
            subtotal: Money::from_cents(2000),
            ..Default::default()
        };
        assert_eq!(
            validate_for_cart(&coupon(CouponKind::RecurringPercent), &plain),
            Err(CartRejection::SubscriptionProductsOnly)
        );
        // rule b fires before rule c
        assert_eq!(
            validate_for_cart(&coupon(CouponKind::RenewalFee), &plain),
            Err(CartRejection::SubscriptionProductsOnly)
        );
    }

    #[test]
    fn test_renewal_kind_without_renewal_names_code() {
        let err = validate_for_cart(&coupon(CouponKind::RenewalFee), &subscription_cart()).unwrap_err();
        assert_eq!(
            err,
            CartRejection::RenewalsOnly {
                code: "PROMO".to_string()
            }
        );
        assert!(err.to_string().contains("\"PROMO\""));
        assert!(err.to_string().contains("only valid for renewals"));
    }

    #[test]
    fn test_sign_up_kinds_need_fee() {
        let no_fee = CartContext {
            subscription_sign_up_fee_total: Money::zero(),
            ..subscription_cart()
        };
        for kind in [CouponKind::SignUpFee, CouponKind::SignUpFeePercent] {
            assert_eq!(
                validate_for_cart(&coupon(kind), &no_fee),
                Err(CartRejection::SignUpFeeRequired)
            );
            assert!(validate_for_cart(&coupon(kind), &subscription_cart()).is_ok());
        }
        assert!(validate_for_cart(&coupon(CouponKind::RecurringFee), &no_fee).is_ok());
    }

    #[test]
    fn test_order_rules() {
        let plain_order = OrderContext::default();
        let subscription = OrderContext {
            is_subscription: true,
            ..Default::default()
        };
        let parent_order = OrderContext {
            contains_subscription_any: true,
            contains_subscription_parent: true,
            ..Default::default()
        };
        let renewal_order = OrderContext {
            contains_subscription_any: true,
            ..Default::default()
        };

        let recurring = coupon(CouponKind::RecurringFee);
        assert_eq!(
            validate_for_order(&recurring, &plain_order),
            Err(OrderRejection::RecurringNeedsSubscription)
        );
        assert!(validate_for_order(&recurring, &subscription).is_ok());
        assert!(validate_for_order(&recurring, &renewal_order).is_ok());

        let sign_up = coupon(CouponKind::SignUpFeePercent);
        assert_eq!(
            validate_for_order(&sign_up, &renewal_order),
            Err(OrderRejection::SignUpFeeNotApplicable {
                code: "PROMO".to_string()
            })
        );
        assert!(validate_for_order(&sign_up, &parent_order).is_ok());
        let with_fee = OrderContext {
            sign_up_fee_total: Money::from_cents(500),
            ..Default::default()
        };
        assert!(validate_for_order(&sign_up, &with_fee).is_ok());

        assert_eq!(
            validate_for_order(&coupon(CouponKind::FixedCart), &subscription),
            Err(OrderRejection::OnlyRecurringOnSubscriptions)
        );
        assert!(validate_for_order(&coupon(CouponKind::FixedCart), &plain_order).is_ok());
    }

    #[test]
    fn test_order_rejection_is_fatal() {
        let err = validate(
            &coupon(CouponKind::Percent),
            EligibilityContext::Order(&OrderContext {
                is_subscription: true,
                ..Default::default()
            }),
        )
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err.into_fatal(), Err(CoreError::CouponNotApplicable(_))));

        let soft = validate(
            &coupon(CouponKind::RecurringFee),
            EligibilityContext::Cart(&CartContext::default()),
        )
        .unwrap_err();
        assert!(!soft.is_fatal());
        assert_eq!(soft.into_fatal().unwrap(), CartRejection::SubscriptionProductsOnly);

        assert!(ensure_applicable_to_order(&coupon(CouponKind::RecurringFee), &OrderContext::default()).is_err());
    }

    #[test]
    fn test_recurring_carry_over() {
        assert!(carries_into_recurring_total(&coupon(CouponKind::RecurringFee)));
        assert!(carries_into_recurring_total(&coupon(CouponKind::RecurringPercent).limited_to(3)));
        assert!(!carries_into_recurring_total(&coupon(CouponKind::RecurringFee).limited_to(1)));
        assert!(!carries_into_recurring_total(&coupon(CouponKind::SignUpFee)));
        assert!(!carries_into_recurring_total(&coupon(CouponKind::FixedCart)));
    }

    #[test]
    fn test_rejection_serializes_with_reason_tag() {
        let json = serde_json::to_string(&CartRejection::RenewalsOnly {
            code: "X".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"reason":"renewals_only","code":"X"}"#);
    }
}
