//! Shared test fixtures for the shoplist integration tests.
//!
//! Provides stores over an in-memory DuckDB backend, a switchable backend
//! that can be told to fail (and counts the calls it receives), and small
//! helpers for building sample lists and items.

#![allow(dead_code)]

use shoplist::backend::Backend;
use shoplist::{
    ItemUpdate, ListItem, ListStore, LocalBackend, NewItem, NewList, ShoplistError, ShoppingList,
    StateDir,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const USER: &str = "user-1";

/// Store over a fresh in-memory local backend, no persisted state.
pub fn setup_store() -> ListStore {
    ListStore::new(Box::new(LocalBackend::in_memory().unwrap()))
}

/// Store over a fresh in-memory backend that persists its UI state in a
/// temporary directory.
///
/// The caller must keep the `TempDir` alive for the duration of the test.
pub fn setup_store_with_state() -> (ListStore, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let state = StateDir::new(tmp_dir.path()).unwrap();
    let store = ListStore::with_state(Box::new(LocalBackend::in_memory().unwrap()), state).unwrap();
    (store, tmp_dir)
}

/// Create a list owned by [`USER`] and make it the current list.
pub fn select_new_list(store: &mut ListStore, name: &str, budget: f64) -> ShoppingList {
    let list = store.create_list(name, budget, USER).unwrap();
    store.set_current_list(Some(list.clone())).unwrap();
    list
}

pub fn add(store: &mut ListStore, list: &ShoppingList, name: &str, quantity: f64, price: f64) -> ListItem {
    store
        .add_item(NewItem::new(&list.id, name, quantity, price))
        .unwrap()
}

pub fn names(items: &[ListItem]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

// ---------------------------------------------------------------------------
// SwitchBackend
// ---------------------------------------------------------------------------

/// Handle that controls a [`SwitchBackend`] after it has been boxed into a
/// store.
#[derive(Clone, Default)]
pub struct Switch {
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl Switch {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of backend calls received so far (failed ones included).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Local backend that can be switched into failing mode.
pub struct SwitchBackend {
    inner: LocalBackend,
    switch: Switch,
}

impl SwitchBackend {
    pub fn new() -> (Self, Switch) {
        let switch = Switch::default();
        (
            Self {
                inner: LocalBackend::in_memory().unwrap(),
                switch: switch.clone(),
            },
            switch,
        )
    }

    fn enter(&self) -> shoplist::Result<()> {
        self.switch.calls.fetch_add(1, Ordering::SeqCst);
        if self.switch.fail.load(Ordering::SeqCst) {
            Err(ShoplistError::Backend {
                status: 503,
                message: "backend unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl Backend for SwitchBackend {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn fetch_lists(&self, user_id: &str) -> shoplist::Result<Vec<ShoppingList>> {
        self.enter()?;
        self.inner.fetch_lists(user_id)
    }

    fn create_list(&self, list: &NewList) -> shoplist::Result<ShoppingList> {
        self.enter()?;
        self.inner.create_list(list)
    }

    fn delete_list(&self, id: &str) -> shoplist::Result<()> {
        self.enter()?;
        self.inner.delete_list(id)
    }

    fn fetch_items(&self, list_id: &str) -> shoplist::Result<Vec<ListItem>> {
        self.enter()?;
        self.inner.fetch_items(list_id)
    }

    fn add_item(&self, item: &NewItem) -> shoplist::Result<ListItem> {
        self.enter()?;
        self.inner.add_item(item)
    }

    fn update_item(&self, id: &str, changes: &ItemUpdate) -> shoplist::Result<ListItem> {
        self.enter()?;
        self.inner.update_item(id, changes)
    }

    fn delete_item(&self, id: &str) -> shoplist::Result<()> {
        self.enter()?;
        self.inner.delete_item(id)
    }

    fn reorder_items(&self, list_id: &str, ordered_ids: &[String]) -> shoplist::Result<()> {
        self.enter()?;
        self.inner.reorder_items(list_id, ordered_ids)
    }
}

/// Store over a [`SwitchBackend`], plus the handle that controls it.
pub fn setup_switch_store() -> (ListStore, Switch) {
    let (backend, switch) = SwitchBackend::new();
    (ListStore::new(Box::new(backend)), switch)
}
