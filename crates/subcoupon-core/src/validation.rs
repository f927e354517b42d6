//! # Validation Module
//!
//! Sanity checks for host-supplied snapshots.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - is the snapshot well formed?                   │
//! │  ├── quantity ≥ 1, fees ≥ 0                                            │
//! │  └── coupon code present, percent ≤ 100                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: eligibility.rs - may this coupon apply here?                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: calculator.rs - how much does it take off?                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator itself never rejects input; hosts that want loud failures
//! on malformed data call these first.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Coupon, LineItem};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest percentage a percent coupon may take off.
pub const MAX_PERCENT: u32 = 100;

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty or whitespace
///
/// ```rust
/// use subcoupon_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("WELCOME10").is_ok());
/// assert!(validate_coupon_code("  ").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity (must be at least 1).
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates that a monetary field is not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line item snapshot.
///
/// ```rust
/// use subcoupon_core::money::Money;
/// use subcoupon_core::types::LineItem;
/// use subcoupon_core::validation::validate_line_item;
///
/// assert!(validate_line_item(&LineItem::new(Money::from_cents(999), 1)).is_ok());
/// assert!(validate_line_item(&LineItem::new(Money::from_cents(999), 0)).is_err());
/// ```
pub fn validate_line_item(line: &LineItem) -> ValidationResult<()> {
    validate_quantity(line.quantity)?;
    validate_non_negative("unit_price", line.unit_price)?;
    validate_non_negative("sign_up_fee", line.sign_up_fee)?;

    if line.is_renewal_line {
        if let Some(id) = &line.renewal_order_id {
            if id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "renewal_order_id".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a coupon record.
///
/// ## Rules
/// - Code must be present
/// - Amount must not be negative
/// - Percent kinds must not exceed 100%
pub fn validate_coupon(coupon: &Coupon) -> CoreResult<()> {
    validate_coupon_code(&coupon.code)?;

    if coupon.amount < Decimal::ZERO {
        return Err(CoreError::InvalidAmount {
            code: coupon.code.clone(),
            reason: "amount must not be negative".to_string(),
        });
    }

    if coupon.kind.is_percent() && coupon.amount > Decimal::from(MAX_PERCENT) {
        return Err(CoreError::InvalidAmount {
            code: coupon.code.clone(),
            reason: format!("percent must not exceed {}", MAX_PERCENT),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CouponKind;

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("SPRING").is_ok());
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("   ").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_validate_line_item() {
        let line = LineItem::new(Money::from_cents(1000), 2).with_sign_up_fee(Money::from_cents(500));
        assert!(validate_line_item(&line).is_ok());

        let negative_fee = line.clone().with_sign_up_fee(Money::from_cents(-1));
        assert!(matches!(
            validate_line_item(&negative_fee),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        let blank_renewal = line.renewal_of(" ");
        assert!(matches!(
            validate_line_item(&blank_renewal),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_coupon() {
        let ok = Coupon::new("TEN", CouponKind::RecurringPercent, Decimal::from(10));
        assert!(validate_coupon(&ok).is_ok());

        let too_much = Coupon::new("MORE", CouponKind::SignUpFeePercent, Decimal::from(150));
        assert!(matches!(
            validate_coupon(&too_much),
            Err(CoreError::InvalidAmount { .. })
        ));

        // 150 off is fine as a fixed amount
        let fixed = Coupon::new("BIG", CouponKind::SignUpFee, Decimal::from(150));
        assert!(validate_coupon(&fixed).is_ok());

        let negative = Coupon::new("NEG", CouponKind::RecurringFee, Decimal::from(-1));
        assert!(validate_coupon(&negative).is_err());

        let blank = Coupon::new("", CouponKind::RecurringFee, Decimal::from(1));
        assert!(matches!(validate_coupon(&blank), Err(CoreError::Validation(_))));
    }
}
