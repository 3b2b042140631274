//! Weekly meal plan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::recipe::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayName {
    #[serde(rename = "Segunda", alias = "Monday")]
    Monday,
    #[serde(rename = "Terça", alias = "Tuesday", alias = "Terca")]
    Tuesday,
    #[serde(rename = "Quarta", alias = "Wednesday")]
    Wednesday,
    #[serde(rename = "Quinta", alias = "Thursday")]
    Thursday,
    #[serde(rename = "Sexta", alias = "Friday")]
    Friday,
    #[serde(rename = "Sábado", alias = "Saturday", alias = "Sabado")]
    Saturday,
    #[serde(rename = "Domingo", alias = "Sunday")]
    Sunday,
}

impl DayName {
    pub const WEEK: [DayName; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Monday => "Segunda",
            Self::Tuesday => "Terça",
            Self::Wednesday => "Quarta",
            Self::Thursday => "Quinta",
            Self::Friday => "Sexta",
            Self::Saturday => "Sábado",
            Self::Sunday => "Domingo",
        }
    }
}

/// Meal time slot (closed set of five)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "Café da Manhã", alias = "Breakfast")]
    Breakfast,
    #[serde(rename = "Lanche da Manhã", alias = "MorningSnack")]
    MorningSnack,
    #[serde(rename = "Almoço", alias = "Lunch")]
    Lunch,
    #[serde(rename = "Lanche da Tarde", alias = "AfternoonSnack")]
    AfternoonSnack,
    #[serde(rename = "Jantar", alias = "Dinner")]
    Dinner,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        Self::Breakfast,
        Self::MorningSnack,
        Self::Lunch,
        Self::AfternoonSnack,
        Self::Dinner,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Breakfast => "Café da Manhã",
            Self::MorningSnack => "Lanche da Manhã",
            Self::Lunch => "Almoço",
            Self::AfternoonSnack => "Lanche da Tarde",
            Self::Dinner => "Jantar",
        }
    }

    /// Slots used for a day with `count` meals, in serving order
    pub fn for_meal_count(count: usize) -> Vec<TimeSlot> {
        match count {
            0 => vec![],
            1 => vec![Self::Lunch],
            2 => vec![Self::Lunch, Self::Dinner],
            3 => vec![Self::Breakfast, Self::Lunch, Self::Dinner],
            4 => vec![Self::Breakfast, Self::Lunch, Self::AfternoonSnack, Self::Dinner],
            _ => Self::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSlot {
    pub id: String,
    pub time_slot: TimeSlot,
    pub recipe: Option<Recipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_name: DayName,
    pub meals: Vec<MealSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub days: Vec<DayPlan>,
}

impl WeeklyPlan {
    /// Recipes in day-then-meal order, skipping empty slots
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.days
            .iter()
            .flat_map(|d| d.meals.iter())
            .filter_map(|m| m.recipe.as_ref())
    }

    pub fn find_slot_mut(&mut self, slot_id: &str) -> Option<&mut MealSlot> {
        self.days
            .iter_mut()
            .flat_map(|d| d.meals.iter_mut())
            .find(|m| m.id == slot_id)
    }
}
