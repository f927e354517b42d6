//! # Error Types
//!
//! Domain-specific error types for subcoupon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  subcoupon-core errors (this file)                                     │
//! │  ├── CoreError        - Hard failures the host must surface            │
//! │  └── ValidationError  - Malformed snapshot input                       │
//! │                                                                         │
//! │  Coupon rejections (eligibility.rs)                                    │
//! │  ├── CartRejection    - Soft: coupon dropped, totals carry on          │
//! │  └── OrderRejection   - Hard: wrapped in CoreError, action aborted     │
//! │                                                                         │
//! │  subcoupon-engine errors (separate crate)                              │
//! │  └── EngineError      - Config loading, wraps CoreError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator has no error type at all: a coupon that does not fit the
//! line or phase simply discounts nothing.

use thiserror::Error;

use crate::eligibility::OrderRejection;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A coupon kind string did not match any known kind.
    ///
    /// ## When This Occurs
    /// - Host passes a discount type registered by some other extension
    /// - Typo in a stored coupon record
    #[error("Unknown coupon kind: '{0}'")]
    UnknownCouponKind(String),

    /// A coupon amount cannot be used with its kind.
    #[error("Invalid amount for coupon {code}: {reason}")]
    InvalidAmount { code: String, reason: String },

    /// Applying a coupon to an order or subscription was refused.
    ///
    /// ## User Workflow
    /// ```text
    /// Admin: "Apply coupon SAVE10 to subscription #42"
    ///      │
    ///      ▼
    /// validate_for_order() → OrderRejection::OnlyRecurringOnSubscriptions
    ///      │
    ///      ▼
    /// CoreError::CouponNotApplicable → action aborted, message shown
    /// ```
    #[error("{0}")]
    CouponNotApplicable(#[from] OrderRejection),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for host-supplied snapshots.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
