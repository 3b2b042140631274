//! User profile as held by the profile store

use serde::{Deserialize, Serialize};

use crate::billing::{SubscriptionState, UsageStats};

/// Nutrition goal driving the recipe strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    LoseWeight,
    GainMuscle,
    #[default]
    Maintain,
    EatHealthy,
}

impl Goal {
    /// kcal per kg of body weight
    fn calorie_factor(&self) -> f64 {
        match self {
            Self::LoseWeight => 25.0,
            Self::Maintain | Self::EatHealthy => 30.0,
            Self::GainMuscle => 35.0,
        }
    }
}

const DEFAULT_DAILY_CALORIES: u32 = 2000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(flatten)]
    pub subscription: SubscriptionState,
    #[serde(default)]
    pub usage_stats: UsageStats,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn is_pro(&self) -> bool {
        self.subscription.is_pro
    }

    /// Fixed formula: body weight times a goal factor
    pub fn daily_calorie_target(&self) -> u32 {
        match self.weight_kg {
            Some(w) if w.is_finite() && w > 0.0 => (w * self.goal.calorie_factor()).round() as u32,
            _ => DEFAULT_DAILY_CALORIES,
        }
    }
}

/// Partial profile write for `ProfileStore::update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_stats: Option<UsageStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn usage(stats: UsageStats) -> Self {
        Self {
            usage_stats: Some(stats),
            ..Default::default()
        }
    }

    pub fn subscription(state: SubscriptionState) -> Self {
        Self {
            subscription: Some(state),
            ..Default::default()
        }
    }

    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(stats) = self.usage_stats {
            profile.usage_stats = stats;
        }
        if let Some(sub) = self.subscription {
            profile.subscription = sub;
        }
        if let Some(goal) = self.goal {
            profile.goal = goal;
        }
        if let Some(r) = self.restrictions {
            profile.restrictions = r;
        }
        if let Some(d) = self.dislikes {
            profile.dislikes = d;
        }
    }
}
