//! Structured generation service
//!
//! Every operation follows the same pipeline: prompt + schema, retried proxy
//! call, strict parse, then entity construction with fresh ids. Internally
//! everything is a `Result<_, GenerationError>`; the public methods convert
//! to `Option` in `settle`, the only place generation errors are swallowed.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::backend::{BackendClient, BackendRequest, GenerationConfig};
use super::citations::citations_for;
use super::images::{fallback_image_url, random_seed, ImageGenerator};
use super::progress::{GenerationPhase, GenerationProgress, NoProgress, ProgressSink};
use super::prompts;
use super::retry::{with_retry, RetryPolicy};
use super::schema::{
    parse_structured, PantryScanDraft, PlanDraft, RecipeDraft, ResponseShape, SchemaNode,
    ShoppingDraft, ShoppingItemDraft,
};
use crate::error::GenerationError;
use crate::models::{
    new_id, DayName, DayPlan, GenerationRequest, Goal, MealSlot, Recipe, ShoppingItem,
    ShoppingList, TimeSlot, UserProfile, WeeklyPlan,
};

const RECIPE_TEMPERATURE: f64 = 0.7;
const PLAN_TEMPERATURE: f64 = 0.8;
const EXTRACTION_TEMPERATURE: f64 = 0.2;

/// Separator between ingredient lines in the shopping prompt
pub const INGREDIENT_SEPARATOR: &str = "; ";

/// Meals a plan day may hold
pub const MEALS_PER_DAY: std::ops::RangeInclusive<usize> = 1..=5;

fn report(progress: &dyn ProgressSink, phase: GenerationPhase, fraction: f32) {
    progress.report(GenerationProgress::new(phase, fraction));
}

/// Log and drop a failed generation
fn settle<T>(operation: &str, result: Result<T, GenerationError>) -> Option<T> {
    match result {
        Ok(value) => {
            info!("[Generation] {} completed", operation);
            Some(value)
        }
        Err(e) => {
            error!("[Generation] {} failed: {}", operation, e);
            None
        }
    }
}

/// Every `(quantity, name)` pair of the plan, day-then-meal-then-ingredient order
pub fn flatten_plan_ingredients(plan: &WeeklyPlan) -> String {
    plan.recipes()
        .flat_map(|r| r.ingredients.iter())
        .map(|i| i.shopping_line())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(INGREDIENT_SEPARATOR)
}

/// Merge items the model left duplicated, keeping the first category
fn consolidate(items: Vec<ShoppingItemDraft>) -> Vec<ShoppingItem> {
    let mut merged: Vec<ShoppingItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let name = item.name.trim().to_string();
        let key = name.to_lowercase();
        let quantity = item.quantity.trim().to_string();
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                if existing.quantity.is_empty() {
                    existing.quantity = quantity;
                } else if !quantity.is_empty() && existing.quantity != quantity {
                    existing.quantity = format!("{} + {}", existing.quantity, quantity);
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(ShoppingItem {
                    id: new_id(),
                    name,
                    quantity,
                    category: item.category,
                    checked: false,
                });
            }
        }
    }
    merged
}

fn clean_ingredient_names(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
        .collect()
}

pub struct GenerationService {
    backend: BackendClient,
    images: Arc<dyn ImageGenerator>,
    text_model: String,
    retry: RetryPolicy,
}

impl GenerationService {
    pub fn new(
        backend: BackendClient,
        images: Arc<dyn ImageGenerator>,
        text_model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            images,
            text_model: text_model.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Retried proxy call parsed into `T`
    async fn request_structured<T: ResponseShape>(
        &self,
        request: BackendRequest,
        progress: &dyn ProgressSink,
    ) -> Result<T, GenerationError> {
        let response = with_retry(self.retry, || self.backend.generate(&request, progress)).await?;
        let text = response.text().ok_or(GenerationError::EmptyResponse)?;
        debug!("[Generation] Received {} chars", text.len());
        parse_structured(text)
    }

    fn structured_request(
        &self,
        prompt: String,
        schema: SchemaNode,
        temperature: f64,
    ) -> BackendRequest {
        BackendRequest::text(
            &self.text_model,
            prompt,
            GenerationConfig::structured(schema.to_value(), temperature),
        )
    }

    // -----------------------------------------------------------------------
    // Single recipe
    // -----------------------------------------------------------------------

    /// Healthy recipe for a dish name or a set of pantry ingredients
    pub async fn generate_recipe(
        &self,
        request: &GenerationRequest,
        goal: Goal,
        restrictions: &[String],
        dislikes: &[String],
        progress: &dyn ProgressSink,
    ) -> Option<Recipe> {
        let result = self
            .try_generate_recipe(request, goal, restrictions, dislikes, progress)
            .await;
        settle("Recipe generation", result)
    }

    async fn try_generate_recipe(
        &self,
        request: &GenerationRequest,
        goal: Goal,
        restrictions: &[String],
        dislikes: &[String],
        progress: &dyn ProgressSink,
    ) -> Result<Recipe, GenerationError> {
        let (prompt, dish_name) = match request {
            GenerationRequest::DishTransform { dish_name } => (
                prompts::build_dish_prompt(dish_name, goal, restrictions, dislikes),
                Some(dish_name.trim()),
            ),
            GenerationRequest::PantryMode { ingredients } => (
                prompts::build_pantry_prompt(ingredients, goal, restrictions, dislikes),
                None,
            ),
            GenerationRequest::WeeklyPlanRequest { .. } => {
                return Err(GenerationError::Unsupported("weekly plan in recipe generation"))
            }
        };

        // in production the backend reports its own connecting/cold-start steps
        if !self.backend.environment().is_production() {
            report(progress, GenerationPhase::Connecting, 0.10);
        }
        let backend_request =
            self.structured_request(prompt, RecipeDraft::schema(), RECIPE_TEMPERATURE);
        let draft: RecipeDraft = self.request_structured(backend_request, progress).await?;
        report(progress, GenerationPhase::Analyzing, 0.30);

        report(progress, GenerationPhase::CreatingImage, 0.70);
        let image_url = match self.images.generate_and_save(&draft.name).await {
            Some(path) => path,
            None => fallback_image_url(&draft.name, random_seed()),
        };

        report(progress, GenerationPhase::Finalizing, 0.90);
        let citations = citations_for(&draft.health_tips);
        let mut recipe = draft.into_recipe(new_id(), image_url, citations, Utc::now());
        if recipe.original_name.is_none() {
            recipe.original_name = dish_name.map(str::to_string);
        }
        Ok(recipe)
    }

    // -----------------------------------------------------------------------
    // Weekly plan
    // -----------------------------------------------------------------------

    /// Seven days of `meals_count` meals; counts outside 1..=5 give `None`
    pub async fn generate_weekly_plan(
        &self,
        profile: &UserProfile,
        preference: &str,
        meals_count: usize,
        allow_repeats: bool,
    ) -> Option<WeeklyPlan> {
        let result = self
            .try_generate_weekly_plan(profile, preference, meals_count, allow_repeats)
            .await;
        settle("Weekly plan generation", result)
    }

    /// Same as `generate_weekly_plan`, driven by a `WeeklyPlanRequest`
    pub async fn generate_plan_for(&self, request: &GenerationRequest) -> Option<WeeklyPlan> {
        match request {
            GenerationRequest::WeeklyPlanRequest {
                profile,
                preference,
                meals_per_day,
                allow_repeats,
            } => {
                self.generate_weekly_plan(profile, preference, *meals_per_day, *allow_repeats)
                    .await
            }
            other => settle(
                "Weekly plan generation",
                Err(GenerationError::Unsupported(other.kind())),
            ),
        }
    }

    async fn try_generate_weekly_plan(
        &self,
        profile: &UserProfile,
        preference: &str,
        meals_per_day: usize,
        allow_repeats: bool,
    ) -> Result<WeeklyPlan, GenerationError> {
        if !MEALS_PER_DAY.contains(&meals_per_day) {
            return Err(GenerationError::Unsupported("meal count outside 1..=5"));
        }
        let slots = TimeSlot::for_meal_count(meals_per_day);
        let slot_labels: Vec<&str> = slots.iter().map(TimeSlot::label).collect();

        let prompt = prompts::build_weekly_plan_prompt(
            profile,
            preference,
            meals_per_day,
            &slot_labels,
            allow_repeats,
        );
        let request = self.structured_request(prompt, PlanDraft::schema(), PLAN_TEMPERATURE);
        let draft: PlanDraft = self.request_structured(request, &NoProgress).await?;
        draft
            .check_meal_count(meals_per_day)
            .map_err(GenerationError::Schema)?;

        let now = Utc::now();
        let days = DayName::WEEK
            .iter()
            .zip(draft.days)
            .map(|(day_name, day)| DayPlan {
                day_name: *day_name,
                meals: slots
                    .iter()
                    .zip(day.meals)
                    .map(|(slot, meal)| {
                        let image_url = fallback_image_url(&meal.recipe.name, random_seed());
                        MealSlot {
                            id: new_id(),
                            time_slot: *slot,
                            recipe: Some(meal.recipe.into_recipe(
                                new_id(),
                                image_url,
                                Vec::new(),
                                now,
                            )),
                        }
                    })
                    .collect(),
            })
            .collect();

        Ok(WeeklyPlan {
            id: new_id(),
            start_date: now,
            days,
        })
    }

    // -----------------------------------------------------------------------
    // Shopping list
    // -----------------------------------------------------------------------

    /// Consolidated shopping list for every ingredient in `plan`
    pub async fn generate_shopping_list(&self, plan: &WeeklyPlan) -> Option<ShoppingList> {
        let result = self.try_generate_shopping_list(plan).await;
        settle("Shopping list generation", result)
    }

    async fn try_generate_shopping_list(
        &self,
        plan: &WeeklyPlan,
    ) -> Result<ShoppingList, GenerationError> {
        let flattened = flatten_plan_ingredients(plan);
        if flattened.is_empty() {
            return Ok(ShoppingList::default());
        }

        let prompt = prompts::build_shopping_prompt(&flattened);
        let request =
            self.structured_request(prompt, ShoppingDraft::schema(), EXTRACTION_TEMPERATURE);
        let draft: ShoppingDraft = self.request_structured(request, &NoProgress).await?;

        Ok(ShoppingList {
            items: consolidate(draft.items),
        })
    }

    // -----------------------------------------------------------------------
    // Pantry photo
    // -----------------------------------------------------------------------

    /// Ingredient names visible in a pantry photo
    pub async fn identify_pantry_ingredients(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Option<Vec<String>> {
        let result = self.try_identify_pantry_ingredients(image_base64, mime_type).await;
        settle("Pantry scan", result)
    }

    async fn try_identify_pantry_ingredients(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<Vec<String>, GenerationError> {
        let request = BackendRequest::with_inline_image(
            &self.text_model,
            prompts::PANTRY_SCAN_PROMPT,
            mime_type,
            image_base64,
            GenerationConfig::structured(
                PantryScanDraft::schema().to_value(),
                EXTRACTION_TEMPERATURE,
            ),
        );
        let draft: PantryScanDraft = self.request_structured(request, &NoProgress).await?;
        Ok(clean_ingredient_names(draft.ingredients))
    }
}
