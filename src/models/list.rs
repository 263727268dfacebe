use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ShoppingList -- a named, budgeted list owned by one user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    pub budget: f64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// NewList -- insert payload; id and timestamps come from the backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewList {
    pub name: String,
    pub budget: f64,
    pub user_id: String,
}

impl NewList {
    pub fn new(name: impl Into<String>, budget: f64, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            budget,
            user_id: user_id.into(),
        }
    }
}
