use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ListItem -- a purchasable line inside a list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub quantity: f64,
    /// Unit price.
    pub price: f64,
    #[serde(default)]
    pub completed: bool,
    /// Rank inside the list; rows written before reordering existed read as 0.
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListItem {
    /// `price * quantity` for this line.
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity
    }
}

// ---------------------------------------------------------------------------
// NewItem -- insert payload; id, timestamps, completion and rank are assigned
// by the backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub list_id: String,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl NewItem {
    pub fn new(list_id: impl Into<String>, name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            list_id: list_id.into(),
            name: name.into(),
            quantity,
            price,
        }
    }
}

// ---------------------------------------------------------------------------
// ItemUpdate -- partial update; `None` fields are left untouched
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemUpdate {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}
