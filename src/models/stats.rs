use serde::{Deserialize, Serialize};

use super::item::ListItem;

// ---------------------------------------------------------------------------
// ListStats -- derived aggregate over a list's loaded items
// ---------------------------------------------------------------------------

/// Aggregate figures for the currently loaded items.
///
/// Never persisted: always recomputed from `(budget, items)` via
/// [`ListStats::compute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ListStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Sum of `price * quantity` over every item, completed or not.
    pub total_spent: f64,
    /// `budget - total_spent`; negative when over budget.
    pub remaining_budget: f64,
}

impl ListStats {
    pub fn compute(budget: f64, items: &[ListItem]) -> Self {
        let completed = items.iter().filter(|i| i.completed).count();
        let total_spent: f64 = items.iter().map(ListItem::line_total).sum();
        Self {
            total: items.len(),
            completed,
            active: items.len() - completed,
            total_spent,
            remaining_budget: budget - total_spent,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.remaining_budget < 0.0
    }
}
