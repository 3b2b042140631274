//! Response shapes for structured generation
//!
//! Each shape is a typed draft struct plus the schema sent to the model, so
//! the request and the parser can't drift apart. Parsing is strict: a draft
//! that deserializes but misses required content is a `Schema` error.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::GenerationError;
use crate::models::{
    Category, Difficulty, Ingredient, Macros, Recipe, ShoppingCategory, Substitution,
};

/// Subset of the model's schema dialect that we use
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Number,
    Enum(Vec<&'static str>),
    Array(Box<SchemaNode>),
    Object(Vec<(&'static str, SchemaNode, bool)>),
}

impl SchemaNode {
    pub fn array(items: SchemaNode) -> Self {
        Self::Array(Box::new(items))
    }

    /// Object whose properties are all required
    pub fn object(properties: Vec<(&'static str, SchemaNode)>) -> Self {
        Self::Object(properties.into_iter().map(|(k, v)| (k, v, true)).collect())
    }

    /// Add an optional property to an object node
    pub fn with_optional(mut self, name: &'static str, node: SchemaNode) -> Self {
        if let Self::Object(ref mut props) = self {
            props.push((name, node, false));
        }
        self
    }

    /// Wire form (`type: OBJECT`, `properties`, `required`, ...)
    pub fn to_value(&self) -> Value {
        match self {
            Self::String => json!({ "type": "STRING" }),
            Self::Number => json!({ "type": "NUMBER" }),
            Self::Enum(values) => json!({ "type": "STRING", "enum": values }),
            Self::Array(items) => json!({ "type": "ARRAY", "items": items.to_value() }),
            Self::Object(props) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (name, node, is_required) in props {
                    properties.insert((*name).to_string(), node.to_value());
                    if *is_required {
                        required.push(*name);
                    }
                }
                json!({ "type": "OBJECT", "properties": properties, "required": required })
            }
        }
    }
}

/// A typed model output
pub trait ResponseShape: DeserializeOwned {
    fn schema() -> SchemaNode;

    /// Content checks serde cannot express
    fn validate(&self) -> Result<(), String>;
}

/// Parse model text into `T`, rejecting empty, malformed or incomplete output
pub fn parse_structured<T: ResponseShape>(text: &str) -> Result<T, GenerationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let parsed: T = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => match extract_json_object(text) {
            Some(inner) if inner.len() < text.len() => serde_json::from_str(inner)?,
            _ => return Err(e.into()),
        },
    };

    parsed.validate().map_err(GenerationError::Schema)?;
    Ok(parsed)
}

/// JSON object inside a response that may carry markdown fences or prose
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        let content_start = text[block_start..]
            .find('\n')
            .map(|i| block_start + i + 1)
            .unwrap_or(block_start);
        if let Some(end) = text[content_start..].find("```") {
            return Some(text[content_start..content_start + end].trim());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn labels<T, const N: usize>(all: [T; N], label: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(label).collect()
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("missing {}", field))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    pub description: String,
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
}

impl RecipeDraft {
    pub fn into_recipe(
        self,
        id: String,
        image_url: String,
        citations: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Recipe {
        Recipe {
            id,
            name: self.name,
            original_name: self.original_name.filter(|n| !n.trim().is_empty()),
            description: self.description,
            image_url,
            prep_time: self.prep_time,
            difficulty: self.difficulty,
            category: self.category,
            macros: self.macros,
            ingredients: self.ingredients,
            instructions: self.instructions,
            substitutions: self.substitutions,
            health_tips: self.health_tips,
            tags: self.tags,
            citations,
            created_at,
        }
    }
}

impl ResponseShape for RecipeDraft {
    fn schema() -> SchemaNode {
        SchemaNode::object(vec![
            ("name", SchemaNode::String),
            ("description", SchemaNode::String),
            ("prepTime", SchemaNode::String),
            ("difficulty", SchemaNode::Enum(labels(Difficulty::ALL, Difficulty::label))),
            ("category", SchemaNode::Enum(labels(Category::ALL, Category::label))),
            (
                "macros",
                SchemaNode::object(vec![
                    ("calories", SchemaNode::Number),
                    ("protein", SchemaNode::Number),
                    ("carbs", SchemaNode::Number),
                    ("fats", SchemaNode::Number),
                ]),
            ),
            (
                "ingredients",
                SchemaNode::array(SchemaNode::object(vec![
                    ("name", SchemaNode::String),
                    ("quantity", SchemaNode::String),
                    ("icon", SchemaNode::String),
                ])),
            ),
            ("instructions", SchemaNode::array(SchemaNode::String)),
            (
                "substitutions",
                SchemaNode::array(SchemaNode::object(vec![
                    ("original", SchemaNode::String),
                    ("replacement", SchemaNode::String),
                    ("reason", SchemaNode::String),
                ])),
            ),
            ("healthTips", SchemaNode::String),
            ("tags", SchemaNode::array(SchemaNode::String)),
        ])
        .with_optional("originalName", SchemaNode::String)
    }

    fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("healthTips", &self.health_tips)?;
        if !self.macros.is_valid() {
            return Err(format!("invalid macros for {}", self.name));
        }
        if self.ingredients.is_empty() {
            return Err(format!("no ingredients for {}", self.name));
        }
        if self.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err(format!("unnamed ingredient in {}", self.name));
        }
        if self.instructions.iter().all(|s| s.trim().is_empty()) {
            return Err(format!("no instructions for {}", self.name));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Weekly plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDraft {
    #[serde(default)]
    pub time_slot: Option<String>,
    pub recipe: RecipeDraft,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDraft {
    #[serde(default)]
    pub day_name: Option<String>,
    pub meals: Vec<MealDraft>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanDraft {
    pub days: Vec<DayDraft>,
}

impl PlanDraft {
    /// Every one of the first seven days must carry at least `meals_per_day`
    /// valid meals. Surplus meals are dropped later and not checked.
    pub fn check_meal_count(&self, meals_per_day: usize) -> Result<(), String> {
        for (index, day) in self.days.iter().take(7).enumerate() {
            if day.meals.len() < meals_per_day {
                return Err(format!(
                    "day {} has {} meals, expected {}",
                    index + 1,
                    day.meals.len(),
                    meals_per_day
                ));
            }
            day.meals
                .iter()
                .take(meals_per_day)
                .try_for_each(|m| m.recipe.validate())?;
        }
        Ok(())
    }
}

impl ResponseShape for PlanDraft {
    fn schema() -> SchemaNode {
        SchemaNode::object(vec![(
            "days",
            SchemaNode::array(SchemaNode::object(vec![
                ("dayName", SchemaNode::String),
                (
                    "meals",
                    SchemaNode::array(SchemaNode::object(vec![
                        ("timeSlot", SchemaNode::String),
                        ("recipe", RecipeDraft::schema()),
                    ])),
                ),
            ])),
        )])
    }

    fn validate(&self) -> Result<(), String> {
        if self.days.len() < 7 {
            return Err(format!("plan has {} days, expected 7", self.days.len()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shopping list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShoppingItemDraft {
    pub name: String,
    pub quantity: String,
    pub category: ShoppingCategory,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShoppingDraft {
    pub items: Vec<ShoppingItemDraft>,
}

impl ResponseShape for ShoppingDraft {
    fn schema() -> SchemaNode {
        SchemaNode::object(vec![(
            "items",
            SchemaNode::array(SchemaNode::object(vec![
                ("name", SchemaNode::String),
                ("quantity", SchemaNode::String),
                (
                    "category",
                    SchemaNode::Enum(labels(ShoppingCategory::ALL, ShoppingCategory::label)),
                ),
            ])),
        )])
    }

    fn validate(&self) -> Result<(), String> {
        self.items.iter().try_for_each(|i| require("item name", &i.name))
    }
}

// ---------------------------------------------------------------------------
// Pantry photo scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PantryScanDraft {
    pub ingredients: Vec<String>,
}

impl ResponseShape for PantryScanDraft {
    fn schema() -> SchemaNode {
        SchemaNode::object(vec![("ingredients", SchemaNode::array(SchemaNode::String))])
    }

    fn validate(&self) -> Result<(), String> {
        if self.ingredients.iter().all(|i| i.trim().is_empty()) {
            return Err("no ingredients identified".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_recipe_json as recipe_json;

    #[test]
    fn test_schema_wire_form() {
        let value = RecipeDraft::schema().to_value();
        assert_eq!(value["type"], "OBJECT");
        assert_eq!(value["properties"]["ingredients"]["type"], "ARRAY");
        assert_eq!(value["properties"]["ingredients"]["items"]["type"], "OBJECT");
        assert_eq!(
            value["properties"]["difficulty"]["enum"],
            json!(["Fácil", "Médio", "Difícil"])
        );
        assert_eq!(value["properties"]["category"]["enum"].as_array().unwrap().len(), 6);

        let required = value["required"].as_array().unwrap();
        assert!(required.contains(&json!("macros")));
        assert!(!required.contains(&json!("originalName")));
        assert!(value["properties"].get("originalName").is_some());
    }

    #[test]
    fn test_parse_valid_recipe() {
        let text = recipe_json("Lasanha de Abobrinha", 420.0, "Rica em fibras").to_string();
        let draft: RecipeDraft = parse_structured(&text).unwrap();
        assert_eq!(draft.macros.calories, 420.0);
        assert_eq!(draft.difficulty, Difficulty::Medium);
        assert_eq!(draft.category, Category::Lunch);
    }

    #[test]
    fn test_parse_fenced_response() {
        let inner = recipe_json("Lasanha", 420.0, "Dica").to_string();
        let text = format!("Claro! Aqui está:\n```json\n{}\n```", inner);
        assert!(parse_structured::<RecipeDraft>(&text).is_ok());
    }

    #[test]
    fn test_parse_failures_are_typed() {
        assert!(matches!(
            parse_structured::<RecipeDraft>("   "),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            parse_structured::<RecipeDraft>("not json"),
            Err(GenerationError::Parse(_))
        ));

        let mut missing = recipe_json("Lasanha", 420.0, "Dica");
        missing["ingredients"] = json!([]);
        assert!(matches!(
            parse_structured::<RecipeDraft>(&missing.to_string()),
            Err(GenerationError::Schema(_))
        ));

        let negative = recipe_json("Lasanha", -5.0, "Dica");
        assert!(matches!(
            parse_structured::<RecipeDraft>(&negative.to_string()),
            Err(GenerationError::Schema(_))
        ));
    }

    #[test]
    fn test_plan_shape_checks() {
        let day = json!({ "dayName": "Segunda", "meals": [
            { "timeSlot": "Almoço", "recipe": recipe_json("A", 300.0, "x") }
        ]});
        let six_days = json!({ "days": vec![day.clone(); 6] }).to_string();
        assert!(matches!(
            parse_structured::<PlanDraft>(&six_days),
            Err(GenerationError::Schema(_))
        ));

        let week = json!({ "days": vec![day; 7] }).to_string();
        let plan: PlanDraft = parse_structured(&week).unwrap();
        assert!(plan.check_meal_count(1).is_ok());
        assert!(plan.check_meal_count(2).is_err());
    }

    #[test]
    fn test_surplus_meals_are_not_validated() {
        let day = json!({ "dayName": "Segunda", "meals": [
            { "timeSlot": "Almoço", "recipe": recipe_json("A", 300.0, "x") },
            { "timeSlot": "Jantar", "recipe": recipe_json("B", -1.0, "x") }
        ]});
        let week = json!({ "days": vec![day; 7] }).to_string();
        let plan: PlanDraft = parse_structured(&week).unwrap();

        assert!(plan.check_meal_count(1).is_ok());
        assert!(plan.check_meal_count(2).is_err());
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("x {\"a\":1} y"), Some("{\"a\":1}"));
        assert_eq!(extract_json_object("```\n{}\n```"), Some("{}"));
        assert_eq!(extract_json_object("nothing"), None);
    }
}
