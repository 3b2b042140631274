//! Local persistence
//!
//! - `kv`: namespaced key -> JSON string store (file-backed or in-memory)
//! - `library`: typed plan / shopping list / saved recipes / history / lists
//! - `profiles`: user profile documents

pub mod kv;
pub mod library;
pub mod profiles;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use library::{Library, RecipeList, MAX_HISTORY};
pub use profiles::{MemoryProfileStore, ProfileStore, SqliteProfileStore};
