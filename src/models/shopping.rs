use serde::{Deserialize, Serialize};

/// Supermarket section (closed set of five)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShoppingCategory {
    #[serde(rename = "Hortifruti", alias = "Produce")]
    Produce,
    #[serde(rename = "Proteínas", alias = "Protein", alias = "Proteinas")]
    Protein,
    #[serde(rename = "Laticínios", alias = "Dairy", alias = "Laticinios")]
    Dairy,
    #[serde(rename = "Mercearia", alias = "Pantry", alias = "Grocery")]
    Pantry,
    #[serde(rename = "Outros", alias = "Other")]
    Other,
}

impl ShoppingCategory {
    pub const ALL: [ShoppingCategory; 5] = [
        Self::Produce,
        Self::Protein,
        Self::Dairy,
        Self::Pantry,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Produce => "Hortifruti",
            Self::Protein => "Proteínas",
            Self::Dairy => "Laticínios",
            Self::Pantry => "Mercearia",
            Self::Other => "Outros",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: String,
    pub name: String,
    /// Human-formatted, never parsed numerically
    pub quantity: String,
    pub category: ShoppingCategory,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Flip `checked` on one item; false if the id is unknown
    pub fn toggle(&mut self, item_id: &str) -> bool {
        match self.items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    pub fn clear_checked(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !i.checked);
        before - self.items.len()
    }
}
