//! Subscription management with local caching
//!
//! Wraps an entitlement source with an explicit init/dispose lifecycle and a
//! TTL-based status cache, and projects entitlements onto the user profile.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use super::entitlement::{
    plan_for_product, EntitlementSource, EntitlementStatus, PurchaseResult, RestoreResult,
};
use super::types::{Plan, SubscriptionState};

/// Helper to acquire read lock with poison recovery
fn acquire_read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<RwLockReadGuard<'_, T>>| {
        warn!("RwLock was poisoned on read, recovering inner value");
        poisoned.into_inner()
    })
}

/// Helper to acquire write lock with poison recovery
fn acquire_write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<RwLockWriteGuard<'_, T>>| {
        warn!("RwLock was poisoned on write, recovering inner value");
        poisoned.into_inner()
    })
}

/// Cache TTL in milliseconds (5 minutes)
const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

struct CachedStatus {
    status: EntitlementStatus,
    cached_at: i64,
}

/// Subscription manager with local cache
pub struct SubscriptionManager {
    source: Box<dyn EntitlementSource>,
    initialized: AtomicBool,
    cache: RwLock<Option<CachedStatus>>,
}

impl SubscriptionManager {
    pub fn new(source: Box<dyn EntitlementSource>) -> Self {
        Self {
            source,
            initialized: AtomicBool::new(false),
            cache: RwLock::new(None),
        }
    }

    /// Connect the entitlement source; safe to call more than once
    pub async fn init(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        let ok = self.source.initialize().await;
        self.initialized.store(ok, Ordering::Release);
        if ok {
            tracing::info!("[Subscription] Entitlement source ready");
        } else {
            warn!("[Subscription] Entitlement source failed to initialize");
        }
        ok
    }

    /// Drop cached state; `init` must be called again before purchases
    pub fn dispose(&self) {
        self.initialized.store(false, Ordering::Release);
        self.invalidate();
        tracing::debug!("[Subscription] Disposed");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub async fn purchase(&self, product_id: &str) -> PurchaseResult {
        if !self.init().await {
            return PurchaseResult {
                success: false,
                error: Some("Store unavailable".into()),
                ..Default::default()
            };
        }
        let result = self.source.purchase(product_id).await;
        self.invalidate();
        if result.success {
            tracing::info!(product = product_id, "[Subscription] Purchase completed");
        } else {
            warn!(
                product = product_id,
                error = result.error.as_deref().unwrap_or(""),
                "[Subscription] Purchase failed"
            );
        }
        result
    }

    pub async fn restore(&self) -> RestoreResult {
        if !self.init().await {
            return RestoreResult {
                success: false,
                product_id: None,
                error: Some("Store unavailable".into()),
            };
        }
        let result = self.source.restore().await;
        self.invalidate();
        result
    }

    /// Cached status, refreshed from the source when older than the TTL
    pub async fn status(&self) -> EntitlementStatus {
        if let Some(status) = self.get_cached() {
            return status;
        }
        if !self.init().await {
            return EntitlementStatus::default();
        }
        let status = self.source.check_status().await;
        *acquire_write_lock(&self.cache) = Some(CachedStatus {
            status: status.clone(),
            cached_at: Utc::now().timestamp_millis(),
        });
        status
    }

    fn get_cached(&self) -> Option<EntitlementStatus> {
        let cache = acquire_read_lock(&self.cache);
        let cached = cache.as_ref()?;
        let age = Utc::now().timestamp_millis() - cached.cached_at;
        (age < CACHE_TTL_MS).then(|| cached.status.clone())
    }

    /// Forces a refresh on next access
    pub fn invalidate(&self) {
        *acquire_write_lock(&self.cache) = None;
    }
}

/// Profile subscription fields implied by an entitlement status
pub fn subscription_state_for(status: &EntitlementStatus, now: DateTime<Utc>) -> SubscriptionState {
    let still_valid = status.expiry_date.map(|e| e > now).unwrap_or(true);
    let plan = status.product_id.as_deref().and_then(plan_for_product);

    match plan {
        Some(plan) if status.is_active && still_valid => SubscriptionState {
            plan,
            is_pro: true,
            subscription_expiry: status.expiry_date,
        },
        _ => SubscriptionState {
            plan: Plan::Free,
            is_pro: false,
            subscription_expiry: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::entitlement::{MockEntitlementSource, PRODUCT_MONTHLY, PRODUCT_YEARLY};
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    fn manager() -> SubscriptionManager {
        SubscriptionManager::new(Box::new(MockEntitlementSource::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let manager = manager();
        assert!(!manager.is_initialized());
        assert!(manager.init().await);
        assert!(manager.is_initialized());
        manager.dispose();
        assert!(!manager.is_initialized());
    }

    #[tokio::test]
    async fn test_purchase_invalidates_cached_status() {
        let manager = manager();
        assert!(!manager.status().await.is_active);

        let result = manager.purchase(PRODUCT_MONTHLY).await;
        assert!(result.success);

        let status = manager.status().await;
        assert!(status.is_active);
        assert_eq!(status.product_id.as_deref(), Some(PRODUCT_MONTHLY));
    }

    #[test]
    fn test_subscription_state_projection() {
        let now = Utc::now();
        let active = EntitlementStatus {
            is_active: true,
            product_id: Some(PRODUCT_YEARLY.into()),
            expiry_date: Some(now + ChronoDuration::days(10)),
        };
        let state = subscription_state_for(&active, now);
        assert!(state.is_pro);
        assert_eq!(state.plan, Plan::Yearly);

        let expired = EntitlementStatus {
            expiry_date: Some(now - ChronoDuration::days(1)),
            ..active.clone()
        };
        assert!(!subscription_state_for(&expired, now).is_pro);

        let unknown = EntitlementStatus {
            product_id: Some("other".into()),
            ..active
        };
        assert_eq!(subscription_state_for(&unknown, now), SubscriptionState::default());
    }
}
