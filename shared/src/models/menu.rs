//! Menu Item Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Menu item entity
///
/// Prices are in minor currency units (cents). A price change never
/// retroactively affects orders: order items capture `name`/`price`
/// at add-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Unit price in minor units, non-negative
    pub price: i64,
    /// Free-text category tag (e.g. "appetizers", "main")
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Create menu item payload (id is assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub image: Option<String>,
}

impl NewMenuItem {
    /// Materialize with a fresh collision-resistant id
    pub fn into_item(self) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            image: self.image,
        }
    }
}

/// Partial update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl MenuItem {
    /// Merge partial fields into this record
    pub fn apply(&mut self, patch: MenuItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(image) = patch.image {
            self.image = Some(image);
        }
    }
}

/// Seed menu used on first run, before any snapshot exists
pub fn sample_menu() -> Vec<MenuItem> {
    let items = [
        (
            "1",
            "Garlic Bread",
            "Toasted bread with garlic butter and herbs",
            7800,
            "appetizers",
        ),
        (
            "2",
            "Bruschetta",
            "Toasted bread topped with tomatoes, garlic, and fresh basil",
            10400,
            "appetizers",
        ),
        (
            "3",
            "Mozzarella Sticks",
            "Breaded mozzarella sticks served with marinara sauce",
            11700,
            "appetizers",
        ),
        (
            "4",
            "Margherita Pizza",
            "Classic pizza with tomato sauce, mozzarella, and fresh basil",
            16900,
            "main",
        ),
        (
            "5",
            "Spaghetti Carbonara",
            "Pasta with eggs, cheese, pancetta, and black pepper",
            18200,
            "main",
        ),
        (
            "6",
            "Grilled Salmon",
            "Fresh salmon fillet with lemon butter sauce",
            24700,
            "main",
        ),
        (
            "7",
            "Tiramisu",
            "Classic Italian dessert with coffee and mascarpone",
            9100,
            "desserts",
        ),
        (
            "8",
            "Espresso",
            "Double shot of freshly ground espresso",
            3900,
            "drinks",
        ),
    ];

    items
        .into_iter()
        .map(|(id, name, description, price, category)| MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: category.to_string(),
            image: None,
        })
        .collect()
}
