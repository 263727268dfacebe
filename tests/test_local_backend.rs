//! LocalBackend tests: direct calls against an in-memory DuckDB database.

use shoplist::{Backend, ItemUpdate, LocalBackend, NewItem, NewList, ShoplistError};

fn backend_with_list() -> (LocalBackend, String) {
    let backend = LocalBackend::in_memory().unwrap();
    let list = backend
        .create_list(&NewList::new("Groceries", 100.0, "user-1"))
        .unwrap();
    (backend, list.id)
}

#[test]
fn create_list_assigns_id_and_timestamps() {
    let backend = LocalBackend::in_memory().unwrap();
    let list = backend
        .create_list(&NewList::new("Groceries", 42.5, "user-1"))
        .unwrap();

    assert!(!list.id.is_empty());
    assert_eq!(list.name, "Groceries");
    assert_eq!(list.budget, 42.5);
    assert_eq!(list.created_at, list.updated_at);
    assert_eq!(backend.get_list(&list.id).unwrap(), Some(list));
}

#[test]
fn delete_list_cascades_to_items() {
    let (backend, list_id) = backend_with_list();
    backend.add_item(&NewItem::new(&list_id, "Milk", 1.0, 1.0)).unwrap();
    backend.add_item(&NewItem::new(&list_id, "Eggs", 12.0, 0.3)).unwrap();
    assert_eq!(backend.count_items(&list_id).unwrap(), 2);

    backend.delete_list(&list_id).unwrap();

    assert_eq!(backend.count_items(&list_id).unwrap(), 0);
    assert!(backend.get_list(&list_id).unwrap().is_none());
}

#[test]
fn add_item_appends_after_highest_position() {
    let (backend, list_id) = backend_with_list();
    let a = backend.add_item(&NewItem::new(&list_id, "A", 1.0, 1.0)).unwrap();
    let b = backend.add_item(&NewItem::new(&list_id, "B", 1.0, 1.0)).unwrap();
    backend
        .reorder_items(&list_id, &[b.id.clone(), a.id.clone()])
        .unwrap();

    let c = backend.add_item(&NewItem::new(&list_id, "C", 1.0, 1.0)).unwrap();

    assert_eq!(c.position, 2);
    assert!(!c.completed);
    let order: Vec<String> = backend
        .fetch_items(&list_id)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(order, vec!["B", "A", "C"]);
}

#[test]
fn positions_are_per_list() {
    let (backend, first) = backend_with_list();
    let second = backend
        .create_list(&NewList::new("Other", 1.0, "user-1"))
        .unwrap();
    backend.add_item(&NewItem::new(&first, "A", 1.0, 1.0)).unwrap();

    let item = backend.add_item(&NewItem::new(&second.id, "B", 1.0, 1.0)).unwrap();
    assert_eq!(item.position, 0);
}

#[test]
fn update_item_applies_only_given_fields() {
    let (backend, list_id) = backend_with_list();
    let item = backend.add_item(&NewItem::new(&list_id, "Milk", 2.0, 3.5)).unwrap();

    let updated = backend
        .update_item(
            &item.id,
            &ItemUpdate {
                quantity: Some(3.0),
                completed: Some(true),
                ..ItemUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Milk");
    assert_eq!(updated.price, 3.5);
    assert_eq!(updated.quantity, 3.0);
    assert!(updated.completed);
    assert_eq!(updated.created_at, item.created_at);
    assert!(updated.updated_at >= item.updated_at);
}

#[test]
fn update_unknown_item_is_not_found() {
    let backend = LocalBackend::in_memory().unwrap();
    let err = backend
        .update_item("missing", &ItemUpdate::completed(true))
        .unwrap_err();
    assert!(matches!(err, ShoplistError::NotFound(_)));
}

#[test]
fn delete_item_removes_row() {
    let (backend, list_id) = backend_with_list();
    let item = backend.add_item(&NewItem::new(&list_id, "Milk", 1.0, 1.0)).unwrap();

    backend.delete_item(&item.id).unwrap();

    assert!(backend.get_item(&item.id).unwrap().is_none());
}

#[test]
fn reorder_with_foreign_item_rolls_back() {
    let (backend, list_id) = backend_with_list();
    let a = backend.add_item(&NewItem::new(&list_id, "A", 1.0, 1.0)).unwrap();
    let b = backend.add_item(&NewItem::new(&list_id, "B", 1.0, 1.0)).unwrap();

    let err = backend
        .reorder_items(&list_id, &[b.id.clone(), "stranger".to_string(), a.id.clone()])
        .unwrap_err();
    assert!(matches!(err, ShoplistError::NotFound(_)));

    let order: Vec<String> = backend
        .fetch_items(&list_id)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(order, vec!["A", "B"]);
}

#[test]
fn file_backend_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("shoplist.duckdb");

    let list_id = {
        let backend = LocalBackend::new(shoplist::Connection::open(&path).unwrap());
        let list = backend
            .create_list(&NewList::new("Groceries", 10.0, "user-1"))
            .unwrap();
        backend.add_item(&NewItem::new(&list.id, "Milk", 1.0, 2.0)).unwrap();
        list.id
    };

    let backend = LocalBackend::new(shoplist::Connection::open(&path).unwrap());
    assert_eq!(backend.fetch_lists("user-1").unwrap().len(), 1);
    assert_eq!(backend.fetch_items(&list_id).unwrap()[0].name, "Milk");
}
