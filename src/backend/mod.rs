//! Persistence backends behind one capability trait.
//!
//! [`ListStore`](crate::store::ListStore) depends only on [`Backend`]; the
//! concrete implementation is picked once, when the application is built:
//!
//! - [`LocalBackend`]: embedded DuckDB tables (file or in-memory).
//! - [`RemoteBackend`]: a PostgREST-style relational REST API.

pub mod local;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

use crate::error::Result;
use crate::models::{ItemUpdate, ListItem, NewItem, NewList, ShoppingList};

/// Data access used by the list store.
///
/// Inserts and updates return the full authoritative row (generated id and
/// timestamps included); deletes only signal success or failure.
pub trait Backend: Send {
    /// Short name for logs (`"local"`, `"remote"`).
    fn name(&self) -> &'static str;

    /// All lists owned by `user_id`, newest first.
    fn fetch_lists(&self, user_id: &str) -> Result<Vec<ShoppingList>>;

    fn create_list(&self, list: &NewList) -> Result<ShoppingList>;

    /// Delete a list together with every item that references it.
    fn delete_list(&self, id: &str) -> Result<()>;

    /// Items of `list_id` by rank, then creation time.
    fn fetch_items(&self, list_id: &str) -> Result<Vec<ListItem>>;

    /// Insert an item. It starts uncompleted and ranked after the list's
    /// current last item.
    fn add_item(&self, item: &NewItem) -> Result<ListItem>;

    /// Apply a partial update and refresh `updated_at`.
    ///
    /// Fails with `NotFound` when no row has this id.
    fn update_item(&self, id: &str, changes: &ItemUpdate) -> Result<ListItem>;

    fn delete_item(&self, id: &str) -> Result<()>;

    /// Persist `position = index` for each id, all belonging to `list_id`.
    ///
    /// Atomic for [`LocalBackend`]. [`RemoteBackend`] writes one row per
    /// request, so a failure part way through leaves the ranks written so
    /// far in place; callers should refetch before trusting the order.
    fn reorder_items(&self, list_id: &str, ordered_ids: &[String]) -> Result<()>;

    /// Install (or with `None`, drop) the signed-in user's access token.
    ///
    /// Backends without a notion of users ignore it.
    fn set_access_token(&mut self, token: Option<String>) {
        let _ = token;
    }
}
