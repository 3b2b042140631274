//! Recipe commands: transform a dish, cook from the pantry, scan a pantry
//! photo, save and unsave recipes

use tracing::info;

use super::{commit_usage, load_profile, AppState, CommandOutcome};
use crate::ai::ProgressSink;
use crate::billing::QuotaAction;
use crate::error::CommandError;
use crate::models::{GenerationRequest, Recipe};

async fn generate_gated(
    state: &AppState,
    uid: &str,
    action: QuotaAction,
    request: GenerationRequest,
    progress: &dyn ProgressSink,
) -> Result<CommandOutcome<Recipe>, CommandError> {
    let profile = load_profile(state, uid).await?;
    if !state.quota.check(action, &profile, &state.now()).is_allowed() {
        info!(uid, action = %action, "Quota reached");
        return Ok(CommandOutcome::LimitReached(action));
    }

    let generated = state
        .generation
        .generate_recipe(
            &request,
            profile.goal,
            &profile.restrictions,
            &profile.dislikes,
            progress,
        )
        .await;
    let Some(recipe) = generated else {
        return Ok(CommandOutcome::Failed);
    };

    commit_usage(state, action, &profile, &state.now()).await?;
    state.library.push_history(&recipe)?;
    Ok(CommandOutcome::Completed(recipe))
}

/// Healthier version of a named dish (transform-desire quota)
pub async fn transform_dish(
    state: &AppState,
    uid: &str,
    dish_name: &str,
    progress: &dyn ProgressSink,
) -> Result<CommandOutcome<Recipe>, CommandError> {
    let request = GenerationRequest::dish(dish_name.trim());
    generate_gated(state, uid, QuotaAction::TransformDesire, request, progress).await
}

/// Recipe from available ingredients (generate-recipe quota)
pub async fn generate_from_pantry(
    state: &AppState,
    uid: &str,
    ingredients: &[String],
    progress: &dyn ProgressSink,
) -> Result<CommandOutcome<Recipe>, CommandError> {
    let request = GenerationRequest::pantry(ingredients.iter().map(|i| i.trim()));
    generate_gated(state, uid, QuotaAction::GenerateRecipe, request, progress).await
}

/// Ingredients in a pantry photo (scan-pantry quota)
pub async fn scan_pantry(
    state: &AppState,
    uid: &str,
    image_base64: &str,
    mime_type: &str,
) -> Result<CommandOutcome<Vec<String>>, CommandError> {
    let profile = load_profile(state, uid).await?;
    if !state
        .quota
        .check(QuotaAction::ScanPantry, &profile, &state.now())
        .is_allowed()
    {
        return Ok(CommandOutcome::LimitReached(QuotaAction::ScanPantry));
    }

    let Some(ingredients) = state
        .generation
        .identify_pantry_ingredients(image_base64, mime_type)
        .await
    else {
        return Ok(CommandOutcome::Failed);
    };

    commit_usage(state, QuotaAction::ScanPantry, &profile, &state.now()).await?;
    Ok(CommandOutcome::Completed(ingredients))
}

/// Save a recipe to the library (save-recipe quota).
///
/// Saving an already-saved recipe completes with `false` and costs nothing.
pub async fn save_recipe(
    state: &AppState,
    uid: &str,
    recipe: &Recipe,
) -> Result<CommandOutcome<bool>, CommandError> {
    if state.library.is_saved(&recipe.id)? {
        return Ok(CommandOutcome::Completed(false));
    }

    let profile = load_profile(state, uid).await?;
    if !state.quota.can_save_recipe(&profile) {
        return Ok(CommandOutcome::LimitReached(QuotaAction::SaveRecipe));
    }

    if !state.library.save_recipe(recipe)? {
        return Ok(CommandOutcome::Completed(false));
    }
    commit_usage(state, QuotaAction::SaveRecipe, &profile, &state.now()).await?;
    Ok(CommandOutcome::Completed(true))
}

/// Remove a saved recipe; the save quota is not refunded
pub async fn unsave_recipe(state: &AppState, recipe_id: &str) -> Result<bool, CommandError> {
    Ok(state.library.unsave_recipe(recipe_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::NoProgress;
    use crate::billing::{Plan, SubscriptionState};
    use crate::commands::state::fake;
    use crate::models::UserProfile;
    use crate::test_utils::{sample_recipe_json, FakeTransport};
    use std::sync::Arc;

    async fn state_with_user(transport: Arc<FakeTransport>) -> AppState {
        let state = fake::state(transport);
        state
            .profiles
            .set("u1", &UserProfile::new("u1"))
            .await
            .unwrap();
        state
    }

    async fn profile(state: &AppState) -> UserProfile {
        state.profiles.get("u1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_failed_generation_does_not_charge_quota() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_text_payload("not json");
        let state = state_with_user(transport).await;
        let before = profile(&state).await;

        let outcome = transform_dish(&state, "u1", "Lasanha", &NoProgress).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Failed);
        assert_eq!(profile(&state).await, before);
        assert!(state.library.history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_commits_then_blocks_without_calling_backend() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_structured(&sample_recipe_json("Lasanha Fit", 420.0, "x"));
        let state = state_with_user(transport.clone()).await;

        let recipe = transform_dish(&state, "u1", "Lasanha", &NoProgress)
            .await
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(recipe.original_name.as_deref(), Some("Lasanha"));

        let stats = profile(&state).await.usage_stats;
        assert_eq!(stats.desires_transformed_today, 1);
        assert!(stats.last_desire_date.is_some());
        assert_eq!(state.library.history().unwrap()[0].id, recipe.id);

        let second = transform_dish(&state, "u1", "Pizza", &NoProgress).await.unwrap();
        assert_eq!(second, CommandOutcome::LimitReached(QuotaAction::TransformDesire));
        assert_eq!(transport.requests().len(), 1);

        // separate bucket
        transport.push_structured(&sample_recipe_json("Omelete", 250.0, "x"));
        let pantry = generate_from_pantry(&state, "u1", &["Ovos".into()], &NoProgress)
            .await
            .unwrap();
        assert!(pantry.completed().is_some());
        assert_eq!(profile(&state).await.usage_stats.recipes_generated_today, 1);
    }

    #[tokio::test]
    async fn test_pro_users_are_never_blocked_or_counted() {
        let transport = Arc::new(FakeTransport::new());
        let state = state_with_user(transport.clone()).await;
        let mut pro = UserProfile::new("u1");
        pro.subscription = SubscriptionState {
            plan: Plan::Yearly,
            is_pro: true,
            subscription_expiry: None,
        };
        state.profiles.set("u1", &pro).await.unwrap();

        for _ in 0..3 {
            transport.push_structured(&sample_recipe_json("Lasanha Fit", 420.0, "x"));
            let outcome = transform_dish(&state, "u1", "Lasanha", &NoProgress).await.unwrap();
            assert!(outcome.completed().is_some());
        }
        assert_eq!(profile(&state).await, pro);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_an_error() {
        let state = fake::state(Arc::new(FakeTransport::new()));
        let err = transform_dish(&state, "ghost", "Lasanha", &NoProgress).await.unwrap_err();
        assert!(matches!(err, CommandError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_pantry_charges_only_on_success() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_network_error("offline");
        transport.push_structured(&serde_json::json!({ "ingredients": ["Ovos", "Tomate"] }));
        let state = state_with_user(transport).await;

        let failed = scan_pantry(&state, "u1", "AAAA", "image/jpeg").await.unwrap();
        assert_eq!(failed, CommandOutcome::Failed);
        assert_eq!(profile(&state).await.usage_stats.pantry_scans_this_week, 0);

        let found = scan_pantry(&state, "u1", "AAAA", "image/jpeg").await.unwrap();
        assert_eq!(found.completed().unwrap(), vec!["Ovos", "Tomate"]);
        assert_eq!(profile(&state).await.usage_stats.pantry_scans_this_week, 1);
    }

    #[tokio::test]
    async fn test_save_quota_is_not_refunded_by_unsave() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_structured(&sample_recipe_json("Lasanha Fit", 420.0, "x"));
        transport.push_structured(&sample_recipe_json("Omelete", 250.0, "x"));
        let state = state_with_user(transport).await;

        let first = generate_from_pantry(&state, "u1", &["Ovos".into()], &NoProgress)
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(save_recipe(&state, "u1", &first).await.unwrap(), CommandOutcome::Completed(true));
        assert_eq!(save_recipe(&state, "u1", &first).await.unwrap(), CommandOutcome::Completed(false));
        assert_eq!(profile(&state).await.usage_stats.saved_recipes_count, 1);

        assert!(unsave_recipe(&state, &first.id).await.unwrap());
        assert_eq!(profile(&state).await.usage_stats.saved_recipes_count, 1);
        assert_eq!(
            save_recipe(&state, "u1", &first).await.unwrap(),
            CommandOutcome::LimitReached(QuotaAction::SaveRecipe)
        );
    }
}
