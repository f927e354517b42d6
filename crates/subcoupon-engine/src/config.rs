//! # Engine Configuration
//!
//! Rounding policy and usage tracking settings for the engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SUBCOUPON_ROUNDING_PLACES=2                                        │
//! │     SUBCOUPON_ROUNDING_MODE=half_even                                  │
//! │     SUBCOUPON_REFUND_EPSILON=0.01                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/subcoupon/subcoupon.toml (Linux)                         │
//! │     ~/Library/Application Support/com.subcoupon.engine/... (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     4 decimal places, half-up, half-cent refund tolerance              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # subcoupon.toml
//! [rounding]
//! decimal_places = 4
//! mode = "half_up"   # half_up | half_even | down
//!
//! [tracking]
//! refund_epsilon = "0.005"
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

use subcoupon_core::limited_use::DEFAULT_REFUND_EPSILON;
use subcoupon_core::{DiscountCalculator, Money, Rounding, UsageTracker};

use crate::error::{EngineError, EngineResult};

/// Highest rounding precision accepted from configuration.
pub const MAX_DECIMAL_PLACES: u32 = 10;

// =============================================================================
// Tracking Settings
// =============================================================================

/// Limited-use tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Tolerance when comparing an order total with its refunded total.
    #[serde(default = "default_refund_epsilon")]
    pub refund_epsilon: Decimal,
}

fn default_refund_epsilon() -> Decimal {
    DEFAULT_REFUND_EPSILON.amount()
}

impl Default for TrackingSettings {
    fn default() -> Self {
        TrackingSettings {
            refund_epsilon: default_refund_epsilon(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rounding applied to every computed discount.
    #[serde(default)]
    pub rounding: Rounding,

    /// Usage tracking settings.
    #[serde(default)]
    pub tracking: TrackingSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (subcoupon.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.rounding.decimal_places > MAX_DECIMAL_PLACES {
            return Err(EngineError::InvalidConfig(format!(
                "rounding.decimal_places must be at most {}, got {}",
                MAX_DECIMAL_PLACES, self.rounding.decimal_places
            )));
        }

        if self.tracking.refund_epsilon < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "tracking.refund_epsilon must not be negative, got {}",
                self.tracking.refund_epsilon
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup; unparsable values are logged
    /// and ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(places) = lookup("SUBCOUPON_ROUNDING_PLACES") {
            match places.trim().parse::<u32>() {
                Ok(p) => {
                    debug!(places = p, "Overriding rounding places from environment");
                    self.rounding.decimal_places = p;
                }
                Err(_) => warn!(places = %places, "Invalid rounding places in environment"),
            }
        }

        if let Some(mode) = lookup("SUBCOUPON_ROUNDING_MODE") {
            match mode.trim().parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding rounding mode from environment");
                    self.rounding.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown rounding mode in environment"),
            }
        }

        if let Some(epsilon) = lookup("SUBCOUPON_REFUND_EPSILON") {
            match Decimal::from_str(epsilon.trim()) {
                Ok(e) => {
                    debug!(epsilon = %e, "Overriding refund epsilon from environment");
                    self.tracking.refund_epsilon = e;
                }
                Err(_) => warn!(epsilon = %epsilon, "Invalid refund epsilon in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "subcoupon", "engine")
            .map(|dirs| dirs.config_dir().join("subcoupon.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Calculator bound to the configured rounding.
    pub fn calculator(&self) -> DiscountCalculator {
        DiscountCalculator::new(self.rounding)
    }

    /// Usage tracker bound to the configured refund tolerance.
    pub fn usage_tracker(&self) -> UsageTracker {
        UsageTracker::new(Money::from_decimal(self.tracking.refund_epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use subcoupon_core::RoundingMode;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.rounding.decimal_places, 4);
        assert_eq!(config.rounding.mode, RoundingMode::HalfUp);
        assert_eq!(config.tracking.refund_epsilon, Decimal::new(5, 3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.rounding.decimal_places = 11;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        config.rounding.decimal_places = 2;
        config.tracking.refund_epsilon = Decimal::new(-1, 2);
        assert!(config.validate().is_err());

        config.tracking.refund_epsilon = Decimal::ZERO;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [rounding]
            decimal_places = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.rounding.decimal_places, 2);
        assert_eq!(config.rounding.mode, RoundingMode::HalfUp);
        assert_eq!(config.tracking, TrackingSettings::default());
    }

    #[test]
    fn test_full_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            [rounding]
            decimal_places = 6
            mode = "half_even"

            [tracking]
            refund_epsilon = "0.01"
            "#,
        )
        .unwrap();

        assert_eq!(config.rounding, Rounding::new(6, RoundingMode::HalfEven));
        assert_eq!(config.tracking.refund_epsilon, Decimal::new(1, 2));
    }

    #[test]
    fn test_overrides() {
        let vars = env(&[
            ("SUBCOUPON_ROUNDING_PLACES", "2"),
            ("SUBCOUPON_ROUNDING_MODE", "bankers"),
            ("SUBCOUPON_REFUND_EPSILON", "0.001"),
        ]);

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).cloned());

        assert_eq!(config.rounding, Rounding::new(2, RoundingMode::HalfEven));
        assert_eq!(config.tracking.refund_epsilon, Decimal::new(1, 3));
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let vars = env(&[
            ("SUBCOUPON_ROUNDING_PLACES", "many"),
            ("SUBCOUPON_ROUNDING_MODE", "sideways"),
            ("SUBCOUPON_REFUND_EPSILON", "tiny"),
        ]);

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).cloned());

        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("subcoupon-test-{}", uuid::Uuid::new_v4()))
            .join("subcoupon.toml");

        let mut config = EngineConfig::default();
        config.rounding = Rounding::new(3, RoundingMode::Down);
        config.save(Some(path.clone())).unwrap();

        let loaded: EngineConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = std::env::temp_dir().join(format!("subcoupon-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("subcoupon.toml");
        std::fs::write(&path, "[rounding\nnot toml").unwrap();

        assert!(EngineConfig::load(Some(path.clone())).is_err());
        let config = EngineConfig::load_or_default(Some(path));
        assert_eq!(config.rounding.decimal_places, 4);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&EngineConfig::default()).unwrap();
        assert!(toml_str.contains("[rounding]"));
        assert!(toml_str.contains("[tracking]"));
        assert!(toml_str.contains("half_up"));
    }

    #[test]
    fn test_derived_components() {
        let mut config = EngineConfig::default();
        config.rounding = Rounding::new(2, RoundingMode::Down);
        assert_eq!(config.calculator().rounding(), config.rounding);
        assert_eq!(config.usage_tracker().refund_epsilon(), DEFAULT_REFUND_EPSILON);
    }
}
