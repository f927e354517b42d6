//! # Coupon Retirement
//!
//! Removes limited-use coupons from a subscription once they are spent.
//!
//! ## When It Runs
//! ```text
//! renewal payment completes
//!      │
//!      ▼
//! limited_codes_for(repo, applied)     ← stored limits, read_raw for renewal kinds
//!      │
//!      ▼
//! UsageTracker::compute_usage(history) ← paid, unrefunded, discounted orders
//!      │
//!      ▼
//! decide_retirement(count, limit)
//!      ├── false ─► coupon stays on the subscription
//!      └── true ──► coupon removed + AuditNote on the subscription
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use subcoupon_core::limited_use::limited_codes_for;
use subcoupon_core::{
    decide_retirement, remaining_payments, Coupon, CouponRepository, RelatedOrder, UsageTracker,
};

use crate::config::EngineConfig;

// =============================================================================
// Audit Notes
// =============================================================================

/// Note left on a subscription when something changed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    pub subscription_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AuditNote {
    /// Note for a limited coupon that was used up.
    pub fn coupon_retired(subscription_id: &str, code: &str, uses: u32) -> Self {
        let noun = if uses == 1 { "time" } else { "times" };
        AuditNote {
            subscription_id: subscription_id.to_string(),
            message: format!(
                "Limited use coupon \"{}\" removed from subscription. It has been used {} {}.",
                code, uses, noun
            ),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// A coupon taken off the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredCoupon {
    pub code: String,
    pub uses: u32,
    pub limit: u32,
}

/// Result of a retirement check on one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementOutcome {
    /// Coupons still applied after the check.
    pub kept: Vec<Coupon>,
    pub retired: Vec<RetiredCoupon>,
    pub notes: Vec<AuditNote>,
}

impl RetirementOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.retired.is_empty()
    }
}

// =============================================================================
// Retirer
// =============================================================================

/// Retires spent limited-use coupons after renewal payments.
#[derive(Debug, Clone)]
pub struct CouponRetirer<R> {
    repo: R,
    tracker: UsageTracker,
}

impl<R: CouponRepository> CouponRetirer<R> {
    pub fn new(repo: R, tracker: UsageTracker) -> Self {
        CouponRetirer { repo, tracker }
    }

    pub fn from_config(repo: R, config: &EngineConfig) -> Self {
        CouponRetirer::new(repo, config.usage_tracker())
    }

    /// Checks every applied coupon against the subscription's order history.
    ///
    /// `history` holds the parent order and every renewal order, including
    /// the one that was just paid.
    pub fn retire_after_renewal(
        &self,
        subscription_id: &str,
        applied: &[Coupon],
        history: &[RelatedOrder],
    ) -> RetirementOutcome {
        let limits = limited_codes_for(&self.repo, applied);
        if limits.is_empty() {
            return RetirementOutcome {
                kept: applied.to_vec(),
                retired: Vec::new(),
                notes: Vec::new(),
            };
        }

        let codes: HashSet<String> = limits.keys().cloned().collect();
        let usage = self.tracker.compute_usage(history, &codes);

        let mut kept = Vec::with_capacity(applied.len());
        let mut retired = Vec::new();
        let mut notes = Vec::new();

        for coupon in applied {
            let (Some(&limit), Some(&uses)) = (limits.get(&coupon.code), usage.get(&coupon.code)) else {
                kept.push(coupon.clone());
                continue;
            };

            if !decide_retirement(uses, limit) {
                debug!(
                    subscription_id,
                    code = %coupon.code,
                    uses,
                    remaining = ?remaining_payments(uses, limit),
                    "limited coupon still active"
                );
                kept.push(coupon.clone());
                continue;
            }

            info!(subscription_id, code = %coupon.code, uses, limit, "Limited use coupon retired");
            notes.push(AuditNote::coupon_retired(subscription_id, &coupon.code, uses));
            retired.push(RetiredCoupon {
                code: coupon.code.clone(),
                uses,
                limit,
            });
        }

        RetirementOutcome {
            kept,
            retired,
            notes,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
