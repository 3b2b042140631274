//! Billing module for subscription management and usage quotas
//!
//! This module handles:
//! - Plan / Pro entitlement state carried on the profile
//! - Free-tier quota checks and commits (pure, no I/O)
//! - Entitlement sources (mock or platform store) with a cached status

pub mod entitlement;
mod limits;
mod subscription;
mod types;

pub use entitlement::{
    EntitlementSource, EntitlementStatus, MockEntitlementSource, PurchaseResult, RestoreResult,
    StoreBridge, StoreEntitlementSource, StoreTransaction, PRODUCT_MONTHLY, PRODUCT_YEARLY,
};
pub use limits::QuotaEngine;
pub use subscription::{subscription_state_for, SubscriptionManager};
pub use types::{
    FreeTierLimits, LimitCheckResult, LimitDenialReason, Plan, QuotaAction, QuotaSummary,
    QuotaUsage, QuotaWindow, SubscriptionState, UsageStats,
};

use std::sync::Arc;

use crate::config::{AppConfig, EntitlementMode};
use crate::error::ConfigError;

/// Pick the entitlement strategy named by the configuration
pub fn entitlement_source_for(
    config: &AppConfig,
    bridge: Option<Arc<dyn StoreBridge>>,
) -> Result<Box<dyn EntitlementSource>, ConfigError> {
    match config.entitlements {
        EntitlementMode::Mock => Ok(Box::new(MockEntitlementSource::new(config.mock_latency))),
        EntitlementMode::Store => {
            let bridge = bridge.ok_or(ConfigError::MissingStoreBridge)?;
            Ok(Box::new(StoreEntitlementSource::new(bridge)))
        }
    }
}
