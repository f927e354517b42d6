//! # Engine Error Types
//!
//! Error types for configuration and pass orchestration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Snapshots    │  │        Core             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  InvalidLine    │  │  CoreError passthrough  │ │
//! │  │  ConfigLoad     │  │                 │  │  (bad coupon, refused   │ │
//! │  │  ConfigSave     │  │                 │  │   order application)    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use subcoupon_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration values out of range.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    /// A line handed to a totals pass failed its sanity checks.
    #[error("Line {index} is invalid: {source}")]
    InvalidLine {
        index: usize,
        #[source]
        source: ValidationError,
    },

    // =========================================================================
    // Core Errors
    // =========================================================================
    /// Error raised by the core rules.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

impl EngineError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_)
                | EngineError::ConfigLoadFailed(_)
                | EngineError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcoupon_core::OrderRejection;

    #[test]
    fn test_config_errors_are_categorized() {
        assert!(EngineError::InvalidConfig("places".into()).is_config_error());
        assert!(EngineError::ConfigLoadFailed("missing".into()).is_config_error());

        let core = EngineError::from(CoreError::from(OrderRejection::RecurringNeedsSubscription));
        assert!(!core.is_config_error());
    }

    #[test]
    fn test_core_error_display_is_transparent() {
        let err = EngineError::from(CoreError::from(OrderRejection::OnlyRecurringOnSubscriptions));
        assert_eq!(
            err.to_string(),
            "You can only apply recurring coupons to subscriptions."
        );
    }

    #[test]
    fn test_invalid_line_display() {
        let err = EngineError::InvalidLine {
            index: 2,
            source: ValidationError::MustBePositive {
                field: "quantity".into(),
            },
        };
        assert!(err.to_string().starts_with("Line 2 is invalid"));
    }
}
