use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::item::ListItem;
use crate::error::ShoplistError;

/// View predicate over the loaded items. Never sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl ItemFilter {
    pub fn matches(&self, item: &ListItem) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Active => !item.completed,
            ItemFilter::Completed => item.completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemFilter::All => "all",
            ItemFilter::Active => "active",
            ItemFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemFilter {
    type Err = ShoplistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ItemFilter::All),
            "active" => Ok(ItemFilter::Active),
            "completed" => Ok(ItemFilter::Completed),
            other => Err(ShoplistError::InvalidArgument(format!(
                "Unknown filter: {}",
                other
            ))),
        }
    }
}
