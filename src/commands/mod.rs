//! Caller layer
//!
//! The operations the UI invokes. Gated operations always run in the same
//! order: quota check, side effect, then commit + persist the profile only
//! when the side effect produced a value. A failed generation never costs
//! quota.

pub mod billing;
pub mod kitchen;
pub mod planner;
pub mod state;

pub use billing::{purchase, refresh_subscription, restore_purchases, subscription_info, SubscriptionInfo};
pub use kitchen::{generate_from_pantry, save_recipe, scan_pantry, transform_dish, unsave_recipe};
pub use planner::{
    build_shopping_list, clear_checked_items, plan_week, swap_meal, toggle_shopping_item,
};
pub use state::AppState;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::billing::QuotaAction;
use crate::error::CommandError;
use crate::models::{ProfileUpdate, UserProfile};

/// Result of a quota-gated operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum CommandOutcome<T> {
    Completed(T),
    /// Blocked before doing anything; show the paywall
    LimitReached(QuotaAction),
    /// The side effect produced nothing; nothing was charged
    Failed,
}

impl<T> CommandOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

pub(crate) async fn load_profile(state: &AppState, uid: &str) -> Result<UserProfile, CommandError> {
    state
        .profiles
        .get(uid)
        .await?
        .ok_or_else(|| CommandError::ProfileNotFound(uid.to_string()))
}

/// Persist one use of `action`; Pro profiles are left untouched
pub(crate) async fn commit_usage<Tz: TimeZone>(
    state: &AppState,
    action: QuotaAction,
    profile: &UserProfile,
    now: &DateTime<Tz>,
) -> Result<UserProfile, CommandError> {
    if profile.is_pro() {
        return Ok(profile.clone());
    }
    let next = state.quota.commit(action, profile, now);
    state
        .profiles
        .update(&profile.uid, ProfileUpdate::usage(next.usage_stats.clone()))
        .await?;
    Ok(next)
}
