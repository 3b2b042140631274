use serde::{Deserialize, Serialize};

use super::profile::UserProfile;

/// What the user asked the generator for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationRequest {
    /// Make a healthier version of a named dish
    #[serde(rename_all = "camelCase")]
    DishTransform { dish_name: String },
    /// Cook something from what is in the pantry
    PantryMode { ingredients: Vec<String> },
    #[serde(rename_all = "camelCase")]
    WeeklyPlanRequest {
        profile: UserProfile,
        preference: String,
        meals_per_day: usize,
        allow_repeats: bool,
    },
}

impl GenerationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DishTransform { .. } => "dish_transform",
            Self::PantryMode { .. } => "pantry_mode",
            Self::WeeklyPlanRequest { .. } => "weekly_plan",
        }
    }

    pub fn dish(name: impl Into<String>) -> Self {
        Self::DishTransform {
            dish_name: name.into(),
        }
    }

    pub fn pantry<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PantryMode {
            ingredients: ingredients.into_iter().map(Into::into).collect(),
        }
    }
}
