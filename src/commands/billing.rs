//! Subscription commands

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::{load_profile, AppState};
use crate::billing::{
    subscription_state_for, PurchaseResult, QuotaSummary, RestoreResult, SubscriptionState,
};
use crate::error::CommandError;
use crate::models::ProfileUpdate;

/// Plan plus quota usage, for the paywall and settings screens
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub subscription: SubscriptionState,
    pub quota: QuotaSummary,
}

/// Buy `product_id`; on success the profile is upgraded immediately
pub async fn purchase(
    state: &AppState,
    uid: &str,
    product_id: &str,
) -> Result<PurchaseResult, CommandError> {
    load_profile(state, uid).await?;
    let result = state.subscription.purchase(product_id).await;
    if result.success {
        refresh_subscription(state, uid).await?;
    }
    Ok(result)
}

pub async fn restore_purchases(state: &AppState, uid: &str) -> Result<RestoreResult, CommandError> {
    load_profile(state, uid).await?;
    let result = state.subscription.restore().await;
    if result.success {
        refresh_subscription(state, uid).await?;
    }
    Ok(result)
}

/// Re-read the entitlement and write `plan` / `isPro` / `subscriptionExpiry`
pub async fn refresh_subscription(
    state: &AppState,
    uid: &str,
) -> Result<SubscriptionState, CommandError> {
    let profile = load_profile(state, uid).await?;
    let status = state.subscription.status().await;
    let subscription = subscription_state_for(&status, Utc::now());

    if subscription != profile.subscription {
        info!(uid, plan = %subscription.plan, "Subscription changed");
        state
            .profiles
            .update(uid, ProfileUpdate::subscription(subscription.clone()))
            .await?;
    }
    Ok(subscription)
}

pub async fn subscription_info(state: &AppState, uid: &str) -> Result<SubscriptionInfo, CommandError> {
    let profile = load_profile(state, uid).await?;
    Ok(SubscriptionInfo {
        quota: state.quota.summary(&profile, &state.now()),
        subscription: profile.subscription,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{Plan, PRODUCT_MONTHLY};
    use crate::commands::state::fake;
    use crate::models::UserProfile;
    use crate::test_utils::FakeTransport;
    use std::sync::Arc;

    async fn state() -> AppState {
        let state = fake::state(Arc::new(FakeTransport::new()));
        state.profiles.set("u1", &UserProfile::new("u1")).await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_purchase_upgrades_profile() {
        let state = state().await;

        let info = subscription_info(&state, "u1").await.unwrap();
        assert!(!info.quota.is_pro);
        assert_eq!(info.quota.usage[0].limit, Some(1));

        let result = purchase(&state, "u1", PRODUCT_MONTHLY).await.unwrap();
        assert!(result.success);

        let info = subscription_info(&state, "u1").await.unwrap();
        assert!(info.subscription.is_pro);
        assert_eq!(info.subscription.plan, Plan::Monthly);
        assert!(info.subscription.subscription_expiry.is_some());
        assert!(info.quota.usage.iter().all(|u| u.limit.is_none()));
    }

    #[tokio::test]
    async fn test_failed_purchase_and_restore_leave_profile_free() {
        let state = state().await;

        let result = purchase(&state, "u1", "unknown.product").await.unwrap();
        assert!(!result.success);

        let restored = restore_purchases(&state, "u1").await.unwrap();
        assert!(!restored.success);

        let profile = state.profiles.get("u1").await.unwrap().unwrap();
        assert!(!profile.is_pro());
        assert_eq!(profile.subscription.plan, Plan::Free);
    }

    #[tokio::test]
    async fn test_refresh_downgrades_when_entitlement_is_gone() {
        let state = state().await;
        let mut stale = UserProfile::new("u1");
        stale.subscription = SubscriptionState {
            plan: Plan::Yearly,
            is_pro: true,
            subscription_expiry: None,
        };
        state.profiles.set("u1", &stale).await.unwrap();

        let refreshed = refresh_subscription(&state, "u1").await.unwrap();
        assert!(!refreshed.is_pro);
        assert!(!state.profiles.get("u1").await.unwrap().unwrap().is_pro());
    }
}
