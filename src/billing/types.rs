//! Billing data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    #[default]
    Free,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// Entitlement as stored on the profile; `is_pro` is trusted as given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_expiry: Option<DateTime<Utc>>,
}

/// Per-user usage counters; windows reset lazily at check/commit time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub recipes_generated_today: u32,
    #[serde(default)]
    pub last_generation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub desires_transformed_today: u32,
    #[serde(default)]
    pub last_desire_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pantry_scans_this_week: u32,
    #[serde(default)]
    pub last_scan_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub saved_recipes_count: u32,
}

/// Quota-gated user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuotaAction {
    GenerateRecipe,
    TransformDesire,
    SaveRecipe,
    ScanPantry,
}

impl QuotaAction {
    pub const ALL: [QuotaAction; 4] = [
        Self::GenerateRecipe,
        Self::TransformDesire,
        Self::SaveRecipe,
        Self::ScanPantry,
    ];

    pub fn window(&self) -> QuotaWindow {
        match self {
            Self::GenerateRecipe | Self::TransformDesire => QuotaWindow::CalendarDay,
            Self::ScanPantry => QuotaWindow::Week,
            Self::SaveRecipe => QuotaWindow::Lifetime,
        }
    }
}

impl std::fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GenerateRecipe => write!(f, "generate-recipe"),
            Self::TransformDesire => write!(f, "transform-desire"),
            Self::SaveRecipe => write!(f, "save-recipe"),
            Self::ScanPantry => write!(f, "scan-pantry"),
        }
    }
}

/// How a counter's window is bucketed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuotaWindow {
    /// Same local calendar date (string equality, not a rolling 24h)
    CalendarDay,
    /// More than 7 whole days since the last use
    Week,
    /// Never resets
    Lifetime,
}

/// Free-tier allowances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTierLimits {
    pub recipes_per_day: u32,
    pub desires_per_day: u32,
    pub scans_per_week: u32,
    pub saved_recipes: u32,
}

impl Default for FreeTierLimits {
    fn default() -> Self {
        Self {
            recipes_per_day: 1,
            desires_per_day: 1,
            scans_per_week: 2,
            saved_recipes: 1,
        }
    }
}

impl FreeTierLimits {
    pub fn limit_for(&self, action: QuotaAction) -> u32 {
        match action {
            QuotaAction::GenerateRecipe => self.recipes_per_day,
            QuotaAction::TransformDesire => self.desires_per_day,
            QuotaAction::ScanPantry => self.scans_per_week,
            QuotaAction::SaveRecipe => self.saved_recipes,
        }
    }
}

/// Result of a quota check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum LimitCheckResult {
    /// `remaining` is `None` for Pro users
    #[serde(rename = "allowed")]
    Allowed { remaining: Option<u32> },
    #[serde(rename = "denied")]
    Denied { reason: LimitDenialReason },
}

impl LimitCheckResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn denial_reason(&self) -> Option<&LimitDenialReason> {
        match self {
            Self::Denied { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDenialReason {
    pub action: QuotaAction,
    pub window: QuotaWindow,
    pub limit: u32,
    pub used: u32,
}

impl std::fmt::Display for LimitDenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let period = match self.window {
            QuotaWindow::CalendarDay => "today",
            QuotaWindow::Week => "this week",
            QuotaWindow::Lifetime => "on the free plan",
        };
        write!(
            f,
            "{} limit reached {}: {}/{} used",
            self.action, period, self.used, self.limit
        )
    }
}

/// Per-action usage view for the paywall screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub action: QuotaAction,
    pub used: u32,
    /// `None` means unlimited
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSummary {
    pub plan: Plan,
    pub is_pro: bool,
    pub usage: Vec<QuotaUsage>,
}
