//! Shopping list entries.

use super::{FlossColor, TimeMs};

/// Intent to buy `quantity` skeins of a color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub id: i64,
    pub user_id: i64,
    pub color: FlossColor,
    pub quantity: i64,
    pub purchased: bool,
    pub note: Option<String>,
    pub created_at: TimeMs,
}
