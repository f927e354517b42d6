//! # Coupon Taxonomy
//!
//! The closed set of coupon kinds the engine understands.
//!
//! ## Kind Groups
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Coupon Kinds                                    │
//! │                                                                         │
//! │  Core (not subscription specific)                                      │
//! │    fixed_cart · percent · fixed_product                                │
//! │                                                                         │
//! │  Recurring        ─ discounts every period (and the first, no trial)   │
//! │    recurring_fee · recurring_percent                                   │
//! │                                                                         │
//! │  Sign-up          ─ discounts the one-off sign-up fee                  │
//! │    sign_up_fee · sign_up_fee_percent                                   │
//! │                                                                         │
//! │  Renewal (virtual) ─ a stored coupon re-applied to a renewal cart      │
//! │    renewal_fee · renewal_percent · renewal_cart                        │
//! │                                                                         │
//! │  recurring_fee ──(renewal cart)──► renewal_fee                         │
//! │  recurring_percent ──────────────► renewal_percent                     │
//! │  fixed_cart ─────────────────────► renewal_cart                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Renewal kinds never exist in storage. Anything that needs the stored
//! record of a renewal-kind coupon (usage limits, for instance) must read it
//! back through [`CouponRepository::read_raw`](crate::repository::CouponRepository::read_raw).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Semantic discount category of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    // Core kinds
    FixedCart,
    Percent,
    FixedProduct,

    // Subscription kinds
    RecurringFee,
    RecurringPercent,
    SignUpFee,
    SignUpFeePercent,

    // Virtual renewal kinds
    RenewalFee,
    RenewalPercent,
    RenewalCart,
}

/// Coarse grouping used for exhaustive dispatch in the calculator and
/// validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindGroup {
    Core,
    Recurring,
    SignUp,
    Renewal,
}

impl CouponKind {
    /// Every kind, core kinds first.
    pub const ALL: [CouponKind; 10] = [
        CouponKind::FixedCart,
        CouponKind::Percent,
        CouponKind::FixedProduct,
        CouponKind::RecurringFee,
        CouponKind::RecurringPercent,
        CouponKind::SignUpFee,
        CouponKind::SignUpFeePercent,
        CouponKind::RenewalFee,
        CouponKind::RenewalPercent,
        CouponKind::RenewalCart,
    ];

    pub fn group(self) -> KindGroup {
        match self {
            CouponKind::FixedCart | CouponKind::Percent | CouponKind::FixedProduct => {
                KindGroup::Core
            }
            CouponKind::RecurringFee | CouponKind::RecurringPercent => KindGroup::Recurring,
            CouponKind::SignUpFee | CouponKind::SignUpFeePercent => KindGroup::SignUp,
            CouponKind::RenewalFee | CouponKind::RenewalPercent | CouponKind::RenewalCart => {
                KindGroup::Renewal
            }
        }
    }

    #[inline]
    pub fn is_core(self) -> bool {
        self.group() == KindGroup::Core
    }

    /// True for all seven subscription-specific kinds, virtual ones included.
    #[inline]
    pub fn is_subscription(self) -> bool {
        !self.is_core()
    }

    #[inline]
    pub fn is_recurring(self) -> bool {
        self.group() == KindGroup::Recurring
    }

    #[inline]
    pub fn is_sign_up(self) -> bool {
        self.group() == KindGroup::SignUp
    }

    /// Renewal kinds are the virtual (pseudo) kinds.
    #[inline]
    pub fn is_renewal(self) -> bool {
        self.group() == KindGroup::Renewal
    }

    /// Whether the coupon amount is a percentage rather than money.
    pub fn is_percent(self) -> bool {
        matches!(
            self,
            CouponKind::Percent
                | CouponKind::RecurringPercent
                | CouponKind::SignUpFeePercent
                | CouponKind::RenewalPercent
        )
    }

    /// The virtual kind a stored coupon takes on when it is carried into a
    /// renewal cart, if it has one.
    pub fn renewal_counterpart(self) -> Option<CouponKind> {
        match self {
            CouponKind::RecurringFee => Some(CouponKind::RenewalFee),
            CouponKind::RecurringPercent => Some(CouponKind::RenewalPercent),
            CouponKind::FixedCart => Some(CouponKind::RenewalCart),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CouponKind::FixedCart => "fixed_cart",
            CouponKind::Percent => "percent",
            CouponKind::FixedProduct => "fixed_product",
            CouponKind::RecurringFee => "recurring_fee",
            CouponKind::RecurringPercent => "recurring_percent",
            CouponKind::SignUpFee => "sign_up_fee",
            CouponKind::SignUpFeePercent => "sign_up_fee_percent",
            CouponKind::RenewalFee => "renewal_fee",
            CouponKind::RenewalPercent => "renewal_percent",
            CouponKind::RenewalCart => "renewal_cart",
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CouponKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        CouponKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownCouponKind(s.to_string()))
    }
}
