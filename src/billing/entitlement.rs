//! Entitlement sources (in-app purchases)
//!
//! Two strategies behind one trait, picked at startup from configuration:
//! - `MockEntitlementSource`: canned successes with simulated latency
//! - `StoreEntitlementSource`: adapts a platform store bridge supplied by the host app

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::types::Plan;

pub const PRODUCT_MONTHLY: &str = "fitswap_pro_monthly";
pub const PRODUCT_YEARLY: &str = "fitswap_pro_yearly";

/// Map a store product id to the plan it unlocks
pub fn plan_for_product(product_id: &str) -> Option<Plan> {
    match product_id {
        PRODUCT_MONTHLY => Some(Plan::Monthly),
        PRODUCT_YEARLY => Some(Plan::Yearly),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub success: bool,
    pub product_id: Option<String>,
    pub receipt: Option<String>,
    pub error: Option<String>,
}

impl PurchaseResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResult {
    pub success: bool,
    pub product_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementStatus {
    pub is_active: bool,
    pub product_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait EntitlementSource: Send + Sync {
    async fn initialize(&self) -> bool;
    async fn purchase(&self, product_id: &str) -> PurchaseResult;
    async fn restore(&self) -> RestoreResult;
    async fn check_status(&self) -> EntitlementStatus;
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Non-production entitlements: every purchase succeeds after `latency`
pub struct MockEntitlementSource {
    latency: Duration,
    purchased: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl MockEntitlementSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            purchased: Mutex::new(None),
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn period_for(plan: Plan) -> ChronoDuration {
    match plan {
        Plan::Yearly => ChronoDuration::days(365),
        _ => ChronoDuration::days(30),
    }
}

#[async_trait]
impl EntitlementSource for MockEntitlementSource {
    async fn initialize(&self) -> bool {
        self.simulate_latency().await;
        tracing::info!("[Entitlements] Mock store initialized");
        true
    }

    async fn purchase(&self, product_id: &str) -> PurchaseResult {
        self.simulate_latency().await;

        let Some(plan) = plan_for_product(product_id) else {
            return PurchaseResult::failed(format!("Unknown product: {}", product_id));
        };

        let expiry = Utc::now() + period_for(plan);
        *self.purchased.lock().await = Some((product_id.to_string(), expiry));

        PurchaseResult {
            success: true,
            product_id: Some(product_id.to_string()),
            receipt: Some(format!("mock-receipt-{}", uuid::Uuid::new_v4())),
            error: None,
        }
    }

    async fn restore(&self) -> RestoreResult {
        self.simulate_latency().await;
        match self.purchased.lock().await.as_ref() {
            Some((product_id, _)) => RestoreResult {
                success: true,
                product_id: Some(product_id.clone()),
                error: None,
            },
            None => RestoreResult {
                success: false,
                product_id: None,
                error: Some("No purchases to restore".into()),
            },
        }
    }

    async fn check_status(&self) -> EntitlementStatus {
        match self.purchased.lock().await.as_ref() {
            Some((product_id, expiry)) if *expiry > Utc::now() => EntitlementStatus {
                is_active: true,
                product_id: Some(product_id.clone()),
                expiry_date: Some(*expiry),
            },
            _ => EntitlementStatus::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Platform store
// ---------------------------------------------------------------------------

/// A transaction as reported by the platform store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTransaction {
    pub transaction_id: String,
    pub product_id: String,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub receipt: Option<String>,
    #[serde(default)]
    pub revoked: bool,
}

impl StoreTransaction {
    fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expiry_date.map(|e| e > now).unwrap_or(true)
    }
}

/// Low-level store calls implemented by the host platform
#[async_trait]
pub trait StoreBridge: Send + Sync {
    async fn connect(&self) -> Result<(), String>;
    async fn request_purchase(&self, product_id: &str) -> Result<StoreTransaction, String>;
    async fn current_transactions(&self) -> Result<Vec<StoreTransaction>, String>;
    async fn finish_transaction(&self, transaction_id: &str) -> Result<(), String>;
}

/// Production entitlements backed by the platform store
pub struct StoreEntitlementSource {
    bridge: Arc<dyn StoreBridge>,
}

impl StoreEntitlementSource {
    pub fn new(bridge: Arc<dyn StoreBridge>) -> Self {
        Self { bridge }
    }

    /// Latest-expiring active subscription among known products
    async fn active_transaction(&self) -> Result<Option<StoreTransaction>, String> {
        let now = Utc::now();
        let transactions = self.bridge.current_transactions().await?;
        Ok(transactions
            .into_iter()
            .filter(|t| plan_for_product(&t.product_id).is_some() && t.is_active_at(now))
            .max_by_key(|t| t.expiry_date.unwrap_or(DateTime::<Utc>::MAX_UTC)))
    }
}

#[async_trait]
impl EntitlementSource for StoreEntitlementSource {
    async fn initialize(&self) -> bool {
        match self.bridge.connect().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[Entitlements] Store connection failed: {}", e);
                false
            }
        }
    }

    async fn purchase(&self, product_id: &str) -> PurchaseResult {
        if plan_for_product(product_id).is_none() {
            return PurchaseResult::failed(format!("Unknown product: {}", product_id));
        }

        let transaction = match self.bridge.request_purchase(product_id).await {
            Ok(t) => t,
            Err(e) => return PurchaseResult::failed(e),
        };

        if let Err(e) = self.bridge.finish_transaction(&transaction.transaction_id).await {
            // The purchase went through; the store will redeliver the transaction
            tracing::warn!(
                transaction = %transaction.transaction_id,
                "[Entitlements] Failed to finish transaction: {}",
                e
            );
        }

        PurchaseResult {
            success: true,
            product_id: Some(transaction.product_id),
            receipt: transaction.receipt,
            error: None,
        }
    }

    async fn restore(&self) -> RestoreResult {
        match self.active_transaction().await {
            Ok(Some(t)) => RestoreResult {
                success: true,
                product_id: Some(t.product_id),
                error: None,
            },
            Ok(None) => RestoreResult {
                success: false,
                product_id: None,
                error: Some("No active subscription found".into()),
            },
            Err(e) => RestoreResult {
                success: false,
                product_id: None,
                error: Some(e),
            },
        }
    }

    async fn check_status(&self) -> EntitlementStatus {
        match self.active_transaction().await {
            Ok(Some(t)) => EntitlementStatus {
                is_active: true,
                product_id: Some(t.product_id),
                expiry_date: t.expiry_date,
            },
            Ok(None) => EntitlementStatus::default(),
            Err(e) => {
                tracing::warn!("[Entitlements] Status check failed: {}", e);
                EntitlementStatus::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeStoreBridge;

    #[tokio::test]
    async fn test_mock_purchase_then_status_and_restore() {
        let source = MockEntitlementSource::new(Duration::ZERO);
        assert!(source.initialize().await);
        assert!(!source.check_status().await.is_active);
        assert!(!source.restore().await.success);

        let result = source.purchase(PRODUCT_YEARLY).await;
        assert!(result.success);
        assert!(result.receipt.unwrap().starts_with("mock-receipt-"));

        let status = source.check_status().await;
        assert!(status.is_active);
        assert_eq!(status.product_id.as_deref(), Some(PRODUCT_YEARLY));

        let restored = source.restore().await;
        assert!(restored.success);
    }

    #[tokio::test]
    async fn test_mock_rejects_unknown_product() {
        let source = MockEntitlementSource::new(Duration::ZERO);
        let result = source.purchase("com.other.product").await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_simulates_latency() {
        let source = MockEntitlementSource::new(Duration::from_millis(800));
        let start = tokio::time::Instant::now();
        source.purchase(PRODUCT_MONTHLY).await;
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_store_picks_active_transaction() {
        let now = Utc::now();
        let bridge = Arc::new(FakeStoreBridge::with_transactions(vec![
            StoreTransaction {
                transaction_id: "t1".into(),
                product_id: PRODUCT_MONTHLY.into(),
                purchase_date: now - ChronoDuration::days(60),
                expiry_date: Some(now - ChronoDuration::days(30)),
                receipt: None,
                revoked: false,
            },
            StoreTransaction {
                transaction_id: "t2".into(),
                product_id: PRODUCT_YEARLY.into(),
                purchase_date: now - ChronoDuration::days(1),
                expiry_date: Some(now + ChronoDuration::days(364)),
                receipt: Some("r2".into()),
                revoked: false,
            },
        ]));
        let source = StoreEntitlementSource::new(bridge);

        let status = source.check_status().await;
        assert!(status.is_active);
        assert_eq!(status.product_id.as_deref(), Some(PRODUCT_YEARLY));

        let restored = source.restore().await;
        assert_eq!(restored.product_id.as_deref(), Some(PRODUCT_YEARLY));
    }

    #[tokio::test]
    async fn test_store_ignores_revoked_and_expired() {
        let now = Utc::now();
        let bridge = Arc::new(FakeStoreBridge::with_transactions(vec![StoreTransaction {
            transaction_id: "t1".into(),
            product_id: PRODUCT_MONTHLY.into(),
            purchase_date: now,
            expiry_date: Some(now + ChronoDuration::days(30)),
            receipt: None,
            revoked: true,
        }]));
        let source = StoreEntitlementSource::new(bridge);
        assert!(!source.check_status().await.is_active);
        assert!(!source.restore().await.success);
    }

    #[tokio::test]
    async fn test_store_purchase_finishes_transaction() {
        let bridge = Arc::new(FakeStoreBridge::default());
        let source = StoreEntitlementSource::new(bridge.clone());

        let result = source.purchase(PRODUCT_MONTHLY).await;
        assert!(result.success);
        assert_eq!(bridge.finished().await.len(), 1);
        assert!(source.check_status().await.is_active);
    }
}
