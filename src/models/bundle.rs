use serde::{Deserialize, Serialize};

use super::item::ListItem;
use super::list::ShoppingList;

/// Export/import payload: the loaded lists and items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub lists: Vec<ShoppingList>,
    #[serde(default)]
    pub items: Vec<ListItem>,
}
