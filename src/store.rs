//! The list/item state container.
//!
//! [`ListStore`] holds the client-side copy of the signed-in user's lists,
//! the selected list's items, the active filter and the derived
//! [`ListStats`]. Every action calls the [`Backend`] first and only then
//! updates local state from the backend's authoritative answer, so a
//! failed call never leaves a half-applied change behind.
//!
//! Actions share one contract:
//!
//! - `is_loading` is `true` while the action runs and `false` afterwards,
//!   whatever the outcome;
//! - `error` is cleared on entry and holds the failure message on exit;
//! - the error is also returned, nothing is retried;
//! - subscribers are notified twice: when the action starts (with
//!   `is_loading` set) and once it has finished.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::config::LIST_STATE_FILE;
use crate::error::{Result, ShoplistError};
use crate::models::{
    ExportBundle, ItemFilter, ItemUpdate, ListItem, ListStats, NewItem, NewList, ShoppingList,
};
use crate::state_file::{self, StateDir};

/// Handle returned by [`ListStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn Fn(&ListStore) + Send>;

/// The part of the store that survives restarts.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedListState {
    #[serde(default)]
    filter: ItemFilter,
    #[serde(default)]
    current_list: Option<ShoppingList>,
}

#[derive(Debug, Deserialize)]
struct ImportedList {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    budget: f64,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ImportedItem {
    list_id: String,
    name: String,
    quantity: f64,
    price: f64,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    position: i64,
}

// ---------------------------------------------------------------------------
// ListStore
// ---------------------------------------------------------------------------

pub struct ListStore {
    backend: Box<dyn Backend>,
    state: Option<StateDir>,

    lists: Vec<ShoppingList>,
    current_list: Option<ShoppingList>,
    items: Vec<ListItem>,
    filter: ItemFilter,
    stats: ListStats,
    is_loading: bool,
    error: Option<String>,

    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl ListStore {
    /// Store over `backend` without any persisted state.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            state: None,
            lists: Vec::new(),
            current_list: None,
            items: Vec::new(),
            filter: ItemFilter::default(),
            stats: ListStats::default(),
            is_loading: false,
            error: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Store that persists its filter and selection in `state` and restores
    /// them right away.
    pub fn with_state(backend: Box<dyn Backend>, state: StateDir) -> Result<Self> {
        let mut store = Self::new(backend);
        store.state = Some(state);
        store.restore()?;
        Ok(store)
    }

    // -- Read access --------------------------------------------------------

    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    pub fn current_list(&self) -> Option<&ShoppingList> {
        self.current_list.as_ref()
    }

    /// Items of the current list, in display order.
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn filter(&self) -> ItemFilter {
        self.filter
    }

    /// Items matching the active filter, in display order.
    pub fn filtered_items(&self) -> Vec<&ListItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    pub fn stats(&self) -> &ListStats {
        &self.stats
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message of the last failed action, cleared when the next one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Authenticate subsequent backend calls as a signed-in user, or drop
    /// the token with `None`. Not an action: no loading toggle, no notify.
    pub fn set_access_token(&mut self, token: Option<String>) {
        self.backend.set_access_token(token);
    }

    // -- Subscriptions ------------------------------------------------------

    /// Call `listener` with the store after every action and state change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&ListStore) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(self);
        }
    }

    // -- Action plumbing ----------------------------------------------------

    /// Run `f` under the loading/error contract described in the module docs.
    fn action<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.is_loading = true;
        self.error = None;
        self.notify();
        let result = f(self);
        self.is_loading = false;
        if let Err(ref e) = result {
            log::error!("{} failed ({} backend): {}", name, self.backend.name(), e);
            self.error = Some(e.to_string());
        }
        self.notify();
        result
    }

    fn recompute_stats(&mut self) {
        let budget = self.current_list.as_ref().map(|l| l.budget).unwrap_or(0.0);
        self.stats = ListStats::compute(budget, &self.items);
    }

    fn is_current(&self, list_id: &str) -> bool {
        self.current_list.as_ref().is_some_and(|l| l.id == list_id)
    }

    fn item_index(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    fn persist(&self) {
        let Some(ref state) = self.state else {
            return;
        };
        let snapshot = PersistedListState {
            filter: self.filter,
            current_list: self.current_list.clone(),
        };
        if let Err(e) = state.save(LIST_STATE_FILE, &snapshot) {
            log::warn!("Could not persist list state: {}", e);
        }
    }

    /// Reload the persisted filter and selection. No backend call is made;
    /// items stay empty until [`fetch_items`](Self::fetch_items) runs.
    pub fn restore(&mut self) -> Result<()> {
        let Some(ref state) = self.state else {
            return Ok(());
        };
        let saved: PersistedListState = state.load(LIST_STATE_FILE)?.unwrap_or_default();
        self.filter = saved.filter;
        self.current_list = saved.current_list;
        self.items.clear();
        self.recompute_stats();
        self.notify();
        Ok(())
    }

    // -- Lists --------------------------------------------------------------

    /// Load every list owned by `user_id`, newest first.
    ///
    /// On any failure the list collection is cleared rather than left stale.
    pub fn fetch_lists(&mut self, user_id: &str) -> Result<()> {
        self.action("fetch_lists", |s| s.load_lists(user_id))
    }

    fn load_lists(&mut self, user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            self.lists.clear();
            return Err(ShoplistError::MissingReference("user id is required".into()));
        }
        match self.backend.fetch_lists(user_id) {
            Ok(lists) => {
                self.lists = lists;
                Ok(())
            }
            Err(e) => {
                self.lists.clear();
                Err(e)
            }
        }
    }

    /// Create a list and put it at the front of the collection.
    ///
    /// Input is expected to be validated by the caller
    /// (see [`ListInput`](crate::validation::ListInput)).
    pub fn create_list(&mut self, name: &str, budget: f64, user_id: &str) -> Result<ShoppingList> {
        let new_list = NewList::new(name, budget, user_id);
        self.action("create_list", |s| s.insert_list(&new_list))
    }

    fn insert_list(&mut self, new_list: &NewList) -> Result<ShoppingList> {
        if new_list.user_id.trim().is_empty() {
            return Err(ShoplistError::MissingReference("user id is required".into()));
        }
        let list = self.backend.create_list(new_list)?;
        self.lists.insert(0, list.clone());
        Ok(list)
    }

    /// Delete a list and all of its items.
    ///
    /// Local state only changes once the backend has confirmed. Deleting the
    /// selected list clears the selection and its items.
    pub fn delete_list(&mut self, id: &str) -> Result<()> {
        self.action("delete_list", |s| {
            if id.trim().is_empty() {
                return Err(ShoplistError::MissingReference("list id is required".into()));
            }
            s.backend.delete_list(id)?;
            s.lists.retain(|l| l.id != id);
            if s.is_current(id) {
                s.current_list = None;
                s.items.clear();
                s.recompute_stats();
                s.persist();
            }
            Ok(())
        })
    }

    /// Select a list (or none). Selecting a list always loads its items.
    pub fn set_current_list(&mut self, list: Option<ShoppingList>) -> Result<()> {
        self.action("set_current_list", |s| {
            s.current_list = list;
            s.persist();
            match s.current_list.as_ref().map(|l| l.id.clone()) {
                Some(list_id) => s.load_items(&list_id),
                None => {
                    s.items.clear();
                    s.recompute_stats();
                    Ok(())
                }
            }
        })
    }

    // -- Items --------------------------------------------------------------

    /// Replace the item collection with the backend's items for `list_id`.
    ///
    /// On failure the collection is cleared. Stats are recomputed either way.
    pub fn fetch_items(&mut self, list_id: &str) -> Result<()> {
        self.action("fetch_items", |s| s.load_items(list_id))
    }

    fn load_items(&mut self, list_id: &str) -> Result<()> {
        let result = if list_id.trim().is_empty() {
            Err(ShoplistError::MissingReference("list id is required".into()))
        } else {
            self.backend.fetch_items(list_id)
        };
        match result {
            Ok(items) => {
                self.items = items;
                self.recompute_stats();
                Ok(())
            }
            Err(e) => {
                self.items.clear();
                self.recompute_stats();
                Err(e)
            }
        }
    }

    /// Add an item. The backend assigns id, timestamps and rank; the item
    /// starts uncompleted.
    ///
    /// The returned row is appended locally when it belongs to the current
    /// list.
    pub fn add_item(&mut self, item: NewItem) -> Result<ListItem> {
        self.action("add_item", |s| s.insert_item(&item))
    }

    fn insert_item(&mut self, item: &NewItem) -> Result<ListItem> {
        if item.list_id.trim().is_empty() {
            return Err(ShoplistError::MissingReference(
                "item has no list reference".into(),
            ));
        }
        let created = self.backend.add_item(item)?;
        if self.is_current(&created.list_id) {
            self.items.push(created.clone());
            self.recompute_stats();
        }
        Ok(created)
    }

    /// Apply a partial update to a loaded item.
    ///
    /// Fails with `NotFound` (no backend call) when `id` is not loaded.
    pub fn update_item(&mut self, id: &str, changes: ItemUpdate) -> Result<ListItem> {
        self.action("update_item", |s| s.apply_update(id, &changes))
    }

    fn apply_update(&mut self, id: &str, changes: &ItemUpdate) -> Result<ListItem> {
        if self.item_index(id).is_none() {
            return Err(ShoplistError::NotFound(format!("Item {}", id)));
        }
        let updated = self.backend.update_item(id, changes)?;
        if let Some(index) = self.item_index(id) {
            self.items[index] = updated.clone();
        }
        self.recompute_stats();
        Ok(updated)
    }

    /// Flip the completion flag of a loaded item.
    pub fn toggle_item_complete(&mut self, id: &str) -> Result<ListItem> {
        self.action("toggle_item_complete", |s| {
            let completed = s
                .item_index(id)
                .map(|i| s.items[i].completed)
                .ok_or_else(|| ShoplistError::NotFound(format!("Item {}", id)))?;
            s.apply_update(id, &ItemUpdate::completed(!completed))
        })
    }

    /// Delete a loaded item.
    ///
    /// Fails with `NotFound` (no backend call) when `id` is not loaded.
    pub fn delete_item(&mut self, id: &str) -> Result<()> {
        self.action("delete_item", |s| {
            if s.item_index(id).is_none() {
                return Err(ShoplistError::NotFound(format!("Item {}", id)));
            }
            s.backend.delete_item(id)?;
            s.items.retain(|i| i.id != id);
            s.recompute_stats();
            Ok(())
        })
    }

    /// Persist a new display order for the loaded items.
    ///
    /// `ordered` must contain exactly the loaded items (by id), each once.
    /// Ranks are written to the backend before the local order changes, so
    /// the order survives the next [`fetch_items`](Self::fetch_items).
    pub fn reorder_items(&mut self, ordered: Vec<ListItem>) -> Result<()> {
        self.action("reorder_items", |s| {
            let list_id = s
                .current_list
                .as_ref()
                .map(|l| l.id.clone())
                .ok_or_else(|| ShoplistError::MissingReference("no list is selected".into()))?;

            let ids: Vec<String> = ordered.iter().map(|i| i.id.clone()).collect();
            let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
            let loaded: HashSet<&str> = s.items.iter().map(|i| i.id.as_str()).collect();
            if unique.len() != ids.len() || unique != loaded {
                return Err(ShoplistError::InvalidArgument(
                    "new order must contain every loaded item exactly once".into(),
                ));
            }

            s.backend.reorder_items(&list_id, &ids)?;

            let mut by_id: HashMap<String, ListItem> =
                s.items.drain(..).map(|i| (i.id.clone(), i)).collect();
            for (position, id) in ids.iter().enumerate() {
                if let Some(mut item) = by_id.remove(id) {
                    item.position = position as i64;
                    s.items.push(item);
                }
            }
            Ok(())
        })
    }

    /// Change the view filter. Never touches the backend or the items.
    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
        self.persist();
        self.notify();
    }

    // -- Export / import ----------------------------------------------------

    /// Serialize the loaded lists and items as pretty-printed JSON.
    pub fn export_data(&self) -> Result<String> {
        let bundle = ExportBundle {
            lists: self.lists.clone(),
            items: self.items.clone(),
        };
        Ok(serde_json::to_string_pretty(&bundle)?)
    }

    /// Re-create the lists and items of an exported payload.
    ///
    /// Every list gets a fresh id; items follow their list to the new id and
    /// keep their relative order and completion state. Items whose list is
    /// not part of the payload are skipped. Afterwards the lists of the first
    /// imported list's owner are fetched. Returns the number of lists
    /// imported.
    pub fn import_data(&mut self, payload: &str) -> Result<usize> {
        self.action("import_data", |s| s.import_payload(payload))
    }

    fn import_payload(&mut self, payload: &str) -> Result<usize> {
        let mut data: serde_json::Value = serde_json::from_str(payload)?;
        let lists_value = match data.get_mut("lists") {
            Some(v) if v.is_array() => v.take(),
            _ => return Err(ShoplistError::InvalidArgument("Invalid data format".into())),
        };
        let lists: Vec<ImportedList> = serde_json::from_value(lists_value)?;
        let mut items: Vec<ImportedItem> = match data.get_mut("items") {
            Some(v) if v.is_array() => serde_json::from_value(v.take())?,
            _ => Vec::new(),
        };
        items.sort_by_key(|i| i.position);

        let mut new_ids: HashMap<String, String> = HashMap::new();
        for list in &lists {
            let created = self.insert_list(&NewList::new(&list.name, list.budget, &list.user_id))?;
            if let Some(ref old_id) = list.id {
                new_ids.insert(old_id.clone(), created.id);
            }
        }

        let mut imported_items = 0usize;
        for item in &items {
            let Some(list_id) = new_ids.get(&item.list_id) else {
                log::warn!(
                    "Skipping imported item {:?}: list {} is not in the payload",
                    item.name,
                    item.list_id
                );
                continue;
            };
            let created =
                self.insert_item(&NewItem::new(list_id, &item.name, item.quantity, item.price))?;
            if item.completed {
                self.backend
                    .update_item(&created.id, &ItemUpdate::completed(true))?;
            }
            imported_items += 1;
        }

        if let Some(first) = lists.first() {
            self.load_lists(&first.user_id)?;
        }
        log::info!(
            "Imported {} lists and {} items",
            lists.len(),
            imported_items
        );
        Ok(lists.len())
    }

    /// Write [`export_data`](Self::export_data) to `path` (gzip when the
    /// name ends in `.gz`).
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        let payload = self.export_data()?;
        state_file::write_text(path, &payload)
    }

    /// Read a payload written by [`export_to_file`](Self::export_to_file)
    /// and import it.
    pub fn import_from_file(&mut self, path: &Path) -> Result<usize> {
        let payload = state_file::read_text(path)?;
        self.import_data(&payload)
    }
}

impl fmt::Debug for ListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListStore")
            .field("backend", &self.backend.name())
            .field("lists", &self.lists.len())
            .field("current_list", &self.current_list.as_ref().map(|l| &l.id))
            .field("items", &self.items.len())
            .field("filter", &self.filter)
            .field("is_loading", &self.is_loading)
            .field("error", &self.error)
            .finish()
    }
}
