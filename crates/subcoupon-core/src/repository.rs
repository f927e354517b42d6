//! # Coupon Repository Seam
//!
//! How the core reads coupon records it was not handed directly.
//!
//! ## Two Read Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  read(code)      the coupon as the current cart sees it                │
//! │                  (a renewal cart may present "LOYAL" as renewal_fee)   │
//! │                                                                         │
//! │  read_raw(code)  the stored record, no overrides                       │
//! │                  ("LOYAL" as recurring_fee, with its usage limit)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host owns storage; this crate only ships an in-memory implementation
//! for tests and for hosts that preload coupon snapshots.

use std::collections::HashMap;

use crate::taxonomy::CouponKind;
use crate::types::Coupon;

/// Read access to coupon records.
pub trait CouponRepository {
    /// Coupon as presented to the current pass, overrides applied.
    fn read(&self, code: &str) -> Option<Coupon>;

    /// Stored coupon record, bypassing any override.
    fn read_raw(&self, code: &str) -> Option<Coupon>;
}

impl<R: CouponRepository + ?Sized> CouponRepository for &R {
    fn read(&self, code: &str) -> Option<Coupon> {
        (**self).read(code)
    }

    fn read_raw(&self, code: &str) -> Option<Coupon> {
        (**self).read_raw(code)
    }
}

/// In-memory coupon store with optional per-code kind overrides.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponRepository {
    stored: HashMap<String, Coupon>,
    kind_overrides: HashMap<String, CouponKind>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a stored coupon.
    pub fn insert(&mut self, coupon: Coupon) {
        self.stored.insert(coupon.code.clone(), coupon);
    }

    /// Presents `code` as `kind` through [`CouponRepository::read`].
    pub fn override_kind(&mut self, code: impl Into<String>, kind: CouponKind) {
        self.kind_overrides.insert(code.into(), kind);
    }

    /// Presents every stored coupon with a renewal counterpart as that
    /// virtual kind, the way a renewal cart sees them.
    pub fn present_as_renewal(&mut self) {
        let overrides: Vec<(String, CouponKind)> = self
            .stored
            .values()
            .filter_map(|c| c.kind.renewal_counterpart().map(|k| (c.code.clone(), k)))
            .collect();
        self.kind_overrides.extend(overrides);
    }

    pub fn clear_overrides(&mut self) {
        self.kind_overrides.clear();
    }

    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }
}

impl FromIterator<Coupon> for InMemoryCouponRepository {
    fn from_iter<I: IntoIterator<Item = Coupon>>(iter: I) -> Self {
        let mut repo = InMemoryCouponRepository::new();
        for coupon in iter {
            repo.insert(coupon);
        }
        repo
    }
}

impl CouponRepository for InMemoryCouponRepository {
    fn read(&self, code: &str) -> Option<Coupon> {
        let coupon = self.stored.get(code)?;
        Some(match self.kind_overrides.get(code) {
            Some(kind) => coupon.as_kind(*kind),
            None => coupon.clone(),
        })
    }

    fn read_raw(&self, code: &str) -> Option<Coupon> {
        self.stored.get(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn repo() -> InMemoryCouponRepository {
        [
            Coupon::new("LOYAL", CouponKind::RecurringFee, Decimal::from(5)).limited_to(3),
            Coupon::new("WELCOME", CouponKind::SignUpFee, Decimal::from(10)),
            Coupon::new("CART", CouponKind::FixedCart, Decimal::from(20)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_read_and_read_raw_agree_without_overrides() {
        let repo = repo();
        assert_eq!(repo.len(), 3);
        assert_eq!(repo.read("LOYAL"), repo.read_raw("LOYAL"));
        assert!(repo.read("MISSING").is_none());
    }

    #[test]
    fn test_override_only_affects_read() {
        let mut repo = repo();
        repo.override_kind("LOYAL", CouponKind::RenewalFee);

        assert_eq!(repo.read("LOYAL").unwrap().kind, CouponKind::RenewalFee);
        let raw = repo.read_raw("LOYAL").unwrap();
        assert_eq!(raw.kind, CouponKind::RecurringFee);
        assert_eq!(raw.usage_limit_payments, 3);
    }

    #[test]
    fn test_present_as_renewal() {
        let mut repo = repo();
        repo.present_as_renewal();

        assert_eq!(repo.read("LOYAL").unwrap().kind, CouponKind::RenewalFee);
        assert_eq!(repo.read("CART").unwrap().kind, CouponKind::RenewalCart);
        // no renewal counterpart
        assert_eq!(repo.read("WELCOME").unwrap().kind, CouponKind::SignUpFee);

        repo.clear_overrides();
        assert_eq!(repo.read("CART").unwrap().kind, CouponKind::FixedCart);
    }
}
