//! Weekly plan and shopping list commands

use tracing::info;

use super::{load_profile, AppState};
use crate::ai::MEALS_PER_DAY;
use crate::error::CommandError;
use crate::models::{Recipe, ShoppingList, WeeklyPlan};

/// Generate and store a new plan; the old plan's shopping list is dropped.
///
/// `Ok(None)` means generation failed and the previous plan is kept.
/// `meals_per_day` must lie in `MEALS_PER_DAY`.
pub async fn plan_week(
    state: &AppState,
    uid: &str,
    preference: &str,
    meals_per_day: usize,
    allow_repeats: bool,
) -> Result<Option<WeeklyPlan>, CommandError> {
    if !MEALS_PER_DAY.contains(&meals_per_day) {
        return Err(CommandError::InvalidInput(format!(
            "{} meals per day, expected {}..={}",
            meals_per_day,
            MEALS_PER_DAY.start(),
            MEALS_PER_DAY.end()
        )));
    }
    let profile = load_profile(state, uid).await?;
    let Some(plan) = state
        .generation
        .generate_weekly_plan(&profile, preference, meals_per_day, allow_repeats)
        .await
    else {
        return Ok(None);
    };

    state.library.clear_plan()?;
    state.library.save_weekly_plan(&plan)?;
    info!(uid, plan = %plan.id, "Weekly plan stored");
    Ok(Some(plan))
}

/// Shopping list for the stored plan
pub async fn build_shopping_list(state: &AppState) -> Result<Option<ShoppingList>, CommandError> {
    let plan = state
        .library
        .weekly_plan()?
        .ok_or_else(|| CommandError::NotFound("weekly plan".into()))?;

    let Some(list) = state.generation.generate_shopping_list(&plan).await else {
        return Ok(None);
    };
    state.library.save_shopping_list(&list)?;
    Ok(Some(list))
}

fn stored_list(state: &AppState) -> Result<ShoppingList, CommandError> {
    state
        .library
        .shopping_list()?
        .ok_or_else(|| CommandError::NotFound("shopping list".into()))
}

pub fn toggle_shopping_item(state: &AppState, item_id: &str) -> Result<ShoppingList, CommandError> {
    let mut list = stored_list(state)?;
    if !list.toggle(item_id) {
        return Err(CommandError::NotFound(format!("shopping item {}", item_id)));
    }
    state.library.save_shopping_list(&list)?;
    Ok(list)
}

/// Drop checked items, returning how many were removed
pub fn clear_checked_items(state: &AppState) -> Result<usize, CommandError> {
    let mut list = stored_list(state)?;
    let removed = list.clear_checked();
    if removed > 0 {
        state.library.save_shopping_list(&list)?;
    }
    Ok(removed)
}

/// Put `recipe` in the meal slot `slot_id` of the stored plan
pub fn swap_meal(
    state: &AppState,
    slot_id: &str,
    recipe: Recipe,
) -> Result<WeeklyPlan, CommandError> {
    let mut plan = state
        .library
        .weekly_plan()?
        .ok_or_else(|| CommandError::NotFound("weekly plan".into()))?;

    let slot = plan
        .find_slot_mut(slot_id)
        .ok_or_else(|| CommandError::NotFound(format!("meal slot {}", slot_id)))?;
    slot.recipe = Some(recipe);

    state.library.save_weekly_plan(&plan)?;
    Ok(plan)
}
