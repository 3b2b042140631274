//! Domain entities produced by generation and persisted locally

mod plan;
mod profile;
mod recipe;
mod request;
mod shopping;

pub use plan::{DayName, DayPlan, MealSlot, TimeSlot, WeeklyPlan};
pub use profile::{Goal, ProfileUpdate, UserProfile};
pub use recipe::{new_id, Category, Difficulty, Ingredient, Macros, Recipe, Substitution};
pub use request::GenerationRequest;
pub use shopping::{ShoppingCategory, ShoppingItem, ShoppingList};
