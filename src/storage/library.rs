//! The user's local recipe library
//!
//! Typed access to everything kept in the key-value store: the current
//! weekly plan and shopping list, saved recipes, recent history and
//! user-created recipe lists.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::kv::KeyValueStore;
use crate::error::StorageError;
use crate::models::{new_id, Recipe, ShoppingList, WeeklyPlan};

const KEY_WEEKLY_PLAN: &str = "fitswap:weekly_plan";
const KEY_SHOPPING_LIST: &str = "fitswap:shopping_list";
const KEY_SAVED_IDS: &str = "fitswap:saved_recipe_ids";
const KEY_SAVED_RECIPES: &str = "fitswap:saved_recipes";
const KEY_HISTORY: &str = "fitswap:recipe_history";
const KEY_LISTS: &str = "fitswap:recipe_lists";

/// Most recent recipes kept in history
pub const MAX_HISTORY: usize = 20;

/// A named, user-curated group of saved recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeList {
    pub id: String,
    pub name: String,
    pub recipe_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub struct Library {
    kv: Arc<dyn KeyValueStore>,
}

impl Library {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Unreadable entries are treated as absent
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("[Library] Ignoring unreadable {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw)
    }

    // Plan and shopping list

    pub fn weekly_plan(&self) -> Result<Option<WeeklyPlan>, StorageError> {
        self.load(KEY_WEEKLY_PLAN)
    }

    pub fn save_weekly_plan(&self, plan: &WeeklyPlan) -> Result<(), StorageError> {
        self.store(KEY_WEEKLY_PLAN, plan)
    }

    pub fn shopping_list(&self) -> Result<Option<ShoppingList>, StorageError> {
        self.load(KEY_SHOPPING_LIST)
    }

    pub fn save_shopping_list(&self, list: &ShoppingList) -> Result<(), StorageError> {
        self.store(KEY_SHOPPING_LIST, list)
    }

    /// Drops the plan together with the list derived from it
    pub fn clear_plan(&self) -> Result<(), StorageError> {
        self.kv.remove_all(&[KEY_WEEKLY_PLAN, KEY_SHOPPING_LIST])
    }

    // Saved recipes

    pub fn saved_recipe_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load(KEY_SAVED_IDS)?.unwrap_or_default())
    }

    pub fn is_saved(&self, recipe_id: &str) -> Result<bool, StorageError> {
        Ok(self.saved_recipe_ids()?.iter().any(|id| id == recipe_id))
    }

    pub fn saved_recipes(&self) -> Result<Vec<Recipe>, StorageError> {
        Ok(self.load(KEY_SAVED_RECIPES)?.unwrap_or_default())
    }

    /// False when the recipe was already saved
    pub fn save_recipe(&self, recipe: &Recipe) -> Result<bool, StorageError> {
        let mut ids = self.saved_recipe_ids()?;
        if ids.iter().any(|id| *id == recipe.id) {
            return Ok(false);
        }
        let mut recipes = self.saved_recipes()?;
        recipes.retain(|r| r.id != recipe.id);
        recipes.insert(0, recipe.clone());
        ids.insert(0, recipe.id.clone());

        self.store(KEY_SAVED_RECIPES, &recipes)?;
        self.store(KEY_SAVED_IDS, &ids)?;
        Ok(true)
    }

    /// Also drops the recipe from every user list
    pub fn unsave_recipe(&self, recipe_id: &str) -> Result<bool, StorageError> {
        let mut ids = self.saved_recipe_ids()?;
        let before = ids.len();
        ids.retain(|id| id != recipe_id);
        if ids.len() == before {
            return Ok(false);
        }
        let mut recipes = self.saved_recipes()?;
        recipes.retain(|r| r.id != recipe_id);

        let mut lists = self.lists()?;
        for list in &mut lists {
            list.recipe_ids.retain(|id| id != recipe_id);
        }

        self.store(KEY_SAVED_IDS, &ids)?;
        self.store(KEY_SAVED_RECIPES, &recipes)?;
        self.store(KEY_LISTS, &lists)?;
        Ok(true)
    }

    pub fn find_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, StorageError> {
        let found = self
            .saved_recipes()?
            .into_iter()
            .chain(self.history()?)
            .find(|r| r.id == recipe_id);
        Ok(found)
    }

    // History

    pub fn history(&self) -> Result<Vec<Recipe>, StorageError> {
        Ok(self.load(KEY_HISTORY)?.unwrap_or_default())
    }

    /// Most-recent-first, one entry per recipe id
    pub fn push_history(&self, recipe: &Recipe) -> Result<(), StorageError> {
        let mut history = self.history()?;
        history.retain(|r| r.id != recipe.id);
        history.insert(0, recipe.clone());
        history.truncate(MAX_HISTORY);
        self.store(KEY_HISTORY, &history)
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        self.kv.remove(KEY_HISTORY)
    }

    // User lists

    pub fn lists(&self) -> Result<Vec<RecipeList>, StorageError> {
        Ok(self.load(KEY_LISTS)?.unwrap_or_default())
    }

    pub fn create_list(&self, name: &str) -> Result<RecipeList, StorageError> {
        let list = RecipeList {
            id: new_id(),
            name: name.trim().to_string(),
            recipe_ids: Vec::new(),
            created_at: Utc::now(),
        };
        let mut lists = self.lists()?;
        lists.push(list.clone());
        self.store(KEY_LISTS, &lists)?;
        Ok(list)
    }

    /// False when the list does not exist or already holds the recipe
    pub fn add_to_list(&self, list_id: &str, recipe_id: &str) -> Result<bool, StorageError> {
        let mut lists = self.lists()?;
        let Some(list) = lists.iter_mut().find(|l| l.id == list_id) else {
            return Ok(false);
        };
        if list.recipe_ids.iter().any(|id| id == recipe_id) {
            return Ok(false);
        }
        list.recipe_ids.push(recipe_id.to_string());
        self.store(KEY_LISTS, &lists)?;
        Ok(true)
    }

    pub fn remove_from_list(&self, list_id: &str, recipe_id: &str) -> Result<bool, StorageError> {
        let mut lists = self.lists()?;
        let Some(list) = lists.iter_mut().find(|l| l.id == list_id) else {
            return Ok(false);
        };
        let before = list.recipe_ids.len();
        list.recipe_ids.retain(|id| id != recipe_id);
        let removed = list.recipe_ids.len() != before;
        if removed {
            self.store(KEY_LISTS, &lists)?;
        }
        Ok(removed)
    }

    pub fn delete_list(&self, list_id: &str) -> Result<bool, StorageError> {
        let mut lists = self.lists()?;
        let before = lists.len();
        lists.retain(|l| l.id != list_id);
        if lists.len() == before {
            return Ok(false);
        }
        self.store(KEY_LISTS, &lists)?;
        Ok(true)
    }
}
