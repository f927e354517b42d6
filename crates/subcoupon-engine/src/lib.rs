//! # subcoupon-engine: Host-Side Orchestration
//!
//! Runs subscription coupon rules inside a host's checkout and renewal flow.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Engine Lifecycle                                │
//! │                                                                         │
//! │  1. init_tracing()               RUST_LOG or "info,subcoupon=debug"     │
//! │                                                                         │
//! │  2. EngineConfig::load(..)       defaults → subcoupon.toml → env        │
//! │                                                                         │
//! │  3. On every totals calculation                                        │
//! │     TotalsPass::run(..) ──► PassOutcome { applied, removed, .. }        │
//! │                                                                         │
//! │  4. After every renewal payment                                        │
//! │     CouponRetirer::retire_after_renewal(..)                             │
//! │         ──► RetirementOutcome { kept, retired, notes }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - TOML + environment configuration
//! - [`pass`] - One totals pass over a cart
//! - [`retirement`] - Limited-use coupon retirement
//! - [`error`] - Engine error types

pub mod config;
pub mod error;
pub mod pass;
pub mod retirement;

pub use config::{EngineConfig, TrackingSettings};
pub use error::{EngineError, EngineResult};
pub use pass::{
    AppliedCoupon, CoreDiscount, NoCoreDiscount, PassInput, PassOutcome, RemovedCoupon, TotalsPass,
};
pub use retirement::{AuditNote, CouponRetirer, RetiredCoupon, RetirementOutcome};

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,subcoupon=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=subcoupon_core=trace` - Show every computed discount
/// - Default: INFO, DEBUG for subcoupon crates
///
/// Does nothing if the host already installed a global subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
