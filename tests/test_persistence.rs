//! Persisted UI state, theme preference, export/import and the application
//! root built over a data directory.

mod common;

use common::{add, names, select_new_list, setup_store, setup_store_with_state, USER};
use shoplist::{
    ItemFilter, ListStore, LocalBackend, ShoplistError, Shoplist, StateDir, Theme, ThemeStore,
};
use std::fs;

fn reopen(dir: &std::path::Path) -> ListStore {
    let state = StateDir::new(dir).unwrap();
    ListStore::with_state(Box::new(LocalBackend::in_memory().unwrap()), state).unwrap()
}

// ---------------------------------------------------------------------------
// List state file
// ---------------------------------------------------------------------------

#[test]
fn filter_and_selection_survive_restart() {
    let (mut store, tmp) = setup_store_with_state();
    let list = select_new_list(&mut store, "Groceries", 25.0);
    add(&mut store, &list, "Milk", 1.0, 2.0);
    store.set_filter(ItemFilter::Completed);

    let restored = reopen(tmp.path());

    assert_eq!(restored.filter(), ItemFilter::Completed);
    assert_eq!(restored.current_list(), Some(&list));
    // items are never persisted
    assert!(restored.items().is_empty());
    assert_eq!(restored.stats().remaining_budget, 25.0);
    assert!(restored.lists().is_empty());
}

#[test]
fn clearing_selection_is_persisted() {
    let (mut store, tmp) = setup_store_with_state();
    select_new_list(&mut store, "Groceries", 25.0);
    store.set_current_list(None).unwrap();

    let restored = reopen(tmp.path());
    assert!(restored.current_list().is_none());
}

#[test]
fn corrupt_state_file_falls_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("list-store.json");
    fs::write(&path, "{ not json").unwrap();

    let store = reopen(tmp.path());

    assert_eq!(store.filter(), ItemFilter::All);
    assert!(store.current_list().is_none());
    assert!(!path.exists());
}

#[test]
fn state_file_is_plain_json() {
    let (mut store, tmp) = setup_store_with_state();
    store.set_filter(ItemFilter::Active);

    let raw = fs::read_to_string(tmp.path().join("list-store.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["filter"], "active");
    assert!(value["current_list"].is_null());
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[test]
fn theme_defaults_to_system() {
    let tmp = tempfile::tempdir().unwrap();
    let theme = ThemeStore::with_state(StateDir::new(tmp.path()).unwrap()).unwrap();
    assert_eq!(theme.theme(), Theme::System);
}

#[test]
fn theme_choice_is_persisted_with_version() {
    let tmp = tempfile::tempdir().unwrap();
    let mut theme = ThemeStore::with_state(StateDir::new(tmp.path()).unwrap()).unwrap();
    theme.set_theme(Theme::Dark).unwrap();

    let raw = fs::read_to_string(tmp.path().join("theme.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["theme"], "dark");

    let reloaded = ThemeStore::with_state(StateDir::new(tmp.path()).unwrap()).unwrap();
    assert_eq!(reloaded.theme(), Theme::Dark);
    assert_eq!(reloaded.resolved(false), shoplist::ResolvedTheme::Dark);
}

#[test]
fn unversioned_theme_file_is_migrated() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("theme.json"), r#"{"theme":"Light"}"#).unwrap();
    let theme = ThemeStore::with_state(StateDir::new(tmp.path()).unwrap()).unwrap();
    assert_eq!(theme.theme(), Theme::Light);

    fs::write(tmp.path().join("theme.json"), r#"{"theme":"sepia"}"#).unwrap();
    let theme = ThemeStore::with_state(StateDir::new(tmp.path()).unwrap()).unwrap();
    assert_eq!(theme.theme(), Theme::System);
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[test]
fn export_contains_loaded_lists_and_items() {
    let mut store = setup_store();
    let list = select_new_list(&mut store, "Groceries", 100.0);
    add(&mut store, &list, "Milk", 2.0, 3.5);

    let payload = store.export_data().unwrap();
    let bundle: shoplist::ExportBundle = serde_json::from_str(&payload).unwrap();

    assert_eq!(bundle.lists, store.lists().to_vec());
    assert_eq!(bundle.items, store.items().to_vec());
    // pretty-printed
    assert!(payload.contains('\n'));
}

#[test]
fn import_recreates_lists_and_items() {
    let mut source = setup_store();
    let list = select_new_list(&mut source, "Groceries", 100.0);
    let milk = add(&mut source, &list, "Milk", 2.0, 3.5);
    add(&mut source, &list, "Bread", 1.0, 4.0);
    add(&mut source, &list, "Eggs", 12.0, 0.25);
    source.toggle_item_complete(&milk.id).unwrap();
    let mut order = source.items().to_vec();
    order.rotate_left(1);
    source.reorder_items(order).unwrap();
    let payload = source.export_data().unwrap();

    let mut target = setup_store();
    let count = target.import_data(&payload).unwrap();

    assert_eq!(count, 1);
    assert_eq!(target.lists().len(), 1);
    let imported = target.lists()[0].clone();
    assert_ne!(imported.id, list.id);
    assert_eq!(imported.name, "Groceries");
    assert_eq!(imported.user_id, USER);

    target.set_current_list(Some(imported)).unwrap();
    assert_eq!(names(target.items()), vec!["Bread", "Eggs", "Milk"]);
    let completed: Vec<bool> = target.items().iter().map(|i| i.completed).collect();
    assert_eq!(completed, vec![false, false, true]);
    assert_eq!(target.stats().total_spent, source.stats().total_spent);
}

#[test]
fn import_skips_items_of_unknown_lists() {
    let mut store = setup_store();
    let payload = serde_json::json!({
        "lists": [
            { "id": "old-1", "name": "Party", "budget": 20.0, "user_id": USER }
        ],
        "items": [
            { "list_id": "old-1", "name": "Chips", "quantity": 2.0, "price": 1.5 },
            { "list_id": "elsewhere", "name": "Ghost", "quantity": 1.0, "price": 1.0 }
        ]
    })
    .to_string();

    assert_eq!(store.import_data(&payload).unwrap(), 1);

    let list = store.lists()[0].clone();
    store.set_current_list(Some(list)).unwrap();
    assert_eq!(names(store.items()), vec!["Chips"]);
}

#[test]
fn import_without_lists_array_is_rejected() {
    let mut store = setup_store();

    for payload in [r#"{"items":[]}"#, r#"{"lists":{}}"#] {
        let err = store.import_data(payload).unwrap_err();
        assert!(matches!(err, ShoplistError::InvalidArgument(_)));
        assert_eq!(store.error(), Some("Invalid argument: Invalid data format"));
    }

    assert!(matches!(
        store.import_data("not json"),
        Err(ShoplistError::Json(_))
    ));
    assert!(store.lists().is_empty());
}

#[test]
fn import_of_empty_lists_keeps_loaded_lists() {
    let (mut store, switch) = common::setup_switch_store();
    store.create_list("Groceries", 1.0, USER).unwrap();
    let calls = switch.calls();

    assert_eq!(store.import_data(r#"{"lists":[],"items":[]}"#).unwrap(), 0);

    assert_eq!(switch.calls(), calls);
    assert_eq!(store.lists().len(), 1);
}

#[test]
fn export_file_round_trip_with_gzip() {
    let mut source = setup_store();
    let list = select_new_list(&mut source, "Groceries", 100.0);
    add(&mut source, &list, "Milk", 2.0, 3.5);

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("backup.json.gz");
    source.export_to_file(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut target = setup_store();
    assert_eq!(target.import_from_file(&path).unwrap(), 1);
    assert_eq!(target.lists()[0].name, "Groceries");
}

#[test]
fn export_file_plain_json() {
    let mut source = setup_store();
    select_new_list(&mut source, "Groceries", 100.0);

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("backup.json");
    source.export_to_file(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"Groceries\""));
}

// ---------------------------------------------------------------------------
// Shoplist over a data directory
// ---------------------------------------------------------------------------

#[test]
fn local_app_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();

    let list_id = {
        let mut app = Shoplist::builder().data_dir(tmp.path()).build().unwrap();
        let lists = app.lists_mut();
        let list = lists.create_list("Groceries", 40.0, USER).unwrap();
        lists.set_current_list(Some(list.clone())).unwrap();
        lists
            .add_item(shoplist::NewItem::new(&list.id, "Milk", 2.0, 3.5))
            .unwrap();
        app.theme_mut().set_theme(Theme::Light).unwrap();
        assert!(app.auth().is_none());
        app.close();
        list.id
    };

    assert!(tmp.path().join("shoplist.duckdb").exists());

    let mut app = Shoplist::builder().data_dir(tmp.path()).build().unwrap();
    assert_eq!(app.theme().theme(), Theme::Light);
    assert_eq!(app.lists().current_list().map(|l| l.id.clone()), Some(list_id.clone()));

    app.lists_mut().fetch_items(&list_id).unwrap();
    assert_eq!(app.lists().stats().total_spent, 7.0);
    assert_eq!(app.lists().stats().remaining_budget, 33.0);

    app.lists_mut().fetch_lists(USER).unwrap();
    assert_eq!(app.lists().lists().len(), 1);
}

#[test]
fn app_without_persisted_state_writes_no_state_files() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = Shoplist::builder()
        .data_dir(tmp.path())
        .in_memory()
        .persist_state(false)
        .build()
        .unwrap();
    app.lists_mut().set_filter(ItemFilter::Active);
    app.theme_mut().set_theme(Theme::Dark).unwrap();

    assert!(!tmp.path().join("list-store.json").exists());
    assert!(!tmp.path().join("theme.json").exists());
    assert!(app.to_string().contains("backend=local"));
}
