//! Recipe entity and its closed vocabularies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipe difficulty, serialized with its localized label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil", alias = "Easy", alias = "Facil")]
    Easy,
    #[serde(rename = "Médio", alias = "Medium", alias = "Medio")]
    Medium,
    #[serde(rename = "Difícil", alias = "Hard", alias = "Dificil")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "Fácil",
            Self::Medium => "Médio",
            Self::Hard => "Difícil",
        }
    }
}

/// Recipe category (closed set of six)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Café da Manhã", alias = "Breakfast")]
    Breakfast,
    #[serde(rename = "Almoço", alias = "Lunch")]
    Lunch,
    #[serde(rename = "Jantar", alias = "Dinner")]
    Dinner,
    #[serde(rename = "Lanche", alias = "Snack")]
    Snack,
    #[serde(rename = "Sobremesa", alias = "Dessert")]
    Dessert,
    #[serde(rename = "Bebida", alias = "Drink")]
    Drink,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Breakfast,
        Self::Lunch,
        Self::Dinner,
        Self::Snack,
        Self::Dessert,
        Self::Drink,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Breakfast => "Café da Manhã",
            Self::Lunch => "Almoço",
            Self::Dinner => "Jantar",
            Self::Snack => "Lanche",
            Self::Dessert => "Sobremesa",
            Self::Drink => "Bebida",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Macros {
    pub fn is_valid(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fats]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub icon: String,
}

impl Ingredient {
    /// "200g Frango" form used for shopping consolidation
    pub fn shopping_line(&self) -> String {
        format!("{} {}", self.quantity.trim(), self.name.trim())
            .trim()
            .to_string()
    }
}

/// A healthier ingredient replacement ("FitSwap")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: String,
    pub replacement: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub description: String,
    pub image_url: String,
    pub prep_time: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub macros: Macros,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    pub health_tips: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fresh opaque identifier for generated entities
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
