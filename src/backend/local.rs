//! Embedded backend over DuckDB tables.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use super::Backend;
use crate::config::{ITEMS_TABLE, LISTS_TABLE};
use crate::connection::Connection;
use crate::error::{Result, ShoplistError};
use crate::models::{ItemUpdate, ListItem, NewItem, NewList, ShoppingList};
use crate::sql_builder::{text, SqlBuilder, SqlValue};

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// LocalBackend
// ---------------------------------------------------------------------------

/// [`Backend`] that keeps lists and items in local DuckDB tables.
///
/// Ids are UUID v4 strings and timestamps are generated here, so rows never
/// depend on a server clock.
pub struct LocalBackend {
    conn: Connection,
}

impl LocalBackend {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Backend over a fresh in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Look up a single list by id.
    pub fn get_list(&self, id: &str) -> Result<Option<ShoppingList>> {
        let (sql, params) = SqlBuilder::new(LISTS_TABLE).where_eq("id", id).limit(1).build();
        Ok(self.conn.execute_into(&sql, &params)?.into_iter().next())
    }

    /// Look up a single item by id.
    pub fn get_item(&self, id: &str) -> Result<Option<ListItem>> {
        let (sql, params) = SqlBuilder::new(ITEMS_TABLE).where_eq("id", id).limit(1).build();
        Ok(self.conn.execute_into(&sql, &params)?.into_iter().next())
    }

    /// Number of item rows referencing `list_id`.
    pub fn count_items(&self, list_id: &str) -> Result<usize> {
        let (sql, params) = SqlBuilder::new(ITEMS_TABLE)
            .select(&["COUNT(*)"])
            .where_eq("list_id", list_id)
            .build();
        let count = self.conn.execute_scalar(&sql, &params)?;
        Ok(count.and_then(|v| v.as_u64()).unwrap_or(0) as usize)
    }

    fn next_position(&self, list_id: &str) -> Result<i64> {
        let (sql, params) = SqlBuilder::new(ITEMS_TABLE)
            .select(&["COALESCE(MAX(position) + 1, 0)"])
            .where_eq("list_id", list_id)
            .build();
        let next = self.conn.execute_scalar(&sql, &params)?;
        Ok(next.and_then(|v| v.as_i64()).unwrap_or(0))
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn fetch_lists(&self, user_id: &str) -> Result<Vec<ShoppingList>> {
        let (sql, params) = SqlBuilder::new(LISTS_TABLE)
            .where_eq("user_id", user_id)
            .order_by(&["created_at DESC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn create_list(&self, list: &NewList) -> Result<ShoppingList> {
        let id = new_id();
        let now = now_text();
        self.conn.run(
            &format!(
                "INSERT INTO {} (id, name, budget, user_id, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                LISTS_TABLE
            ),
            &[
                text(&id),
                text(&list.name),
                SqlValue::Double(list.budget),
                text(&list.user_id),
                text(&now),
                text(&now),
            ],
        )?;
        log::debug!("local: created list {}", id);
        self.get_list(&id)?
            .ok_or_else(|| ShoplistError::NotFound(format!("List {} vanished after insert", id)))
    }

    fn delete_list(&self, id: &str) -> Result<()> {
        self.conn.in_transaction(|conn| {
            let (sql, params) = SqlBuilder::delete(ITEMS_TABLE).where_eq("list_id", id).build();
            let items = conn.run(&sql, &params)?;
            let (sql, params) = SqlBuilder::delete(LISTS_TABLE).where_eq("id", id).build();
            conn.run(&sql, &params)?;
            log::debug!("local: deleted list {} and {} items", id, items);
            Ok(())
        })
    }

    fn fetch_items(&self, list_id: &str) -> Result<Vec<ListItem>> {
        let (sql, params) = SqlBuilder::new(ITEMS_TABLE)
            .where_eq("list_id", list_id)
            .order_by(&["position ASC", "created_at ASC"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn add_item(&self, item: &NewItem) -> Result<ListItem> {
        let id = new_id();
        let now = now_text();
        let position = self.next_position(&item.list_id)?;
        self.conn.run(
            &format!(
                "INSERT INTO {} \
                 (id, list_id, name, quantity, price, completed, position, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, FALSE, ?, ?, ?)",
                ITEMS_TABLE
            ),
            &[
                text(&id),
                text(&item.list_id),
                text(&item.name),
                SqlValue::Double(item.quantity),
                SqlValue::Double(item.price),
                SqlValue::BigInt(position),
                text(&now),
                text(&now),
            ],
        )?;
        log::debug!("local: added item {} to list {}", id, item.list_id);
        self.get_item(&id)?
            .ok_or_else(|| ShoplistError::NotFound(format!("Item {} vanished after insert", id)))
    }

    fn update_item(&self, id: &str, changes: &ItemUpdate) -> Result<ListItem> {
        if self.get_item(id)?.is_none() {
            return Err(ShoplistError::NotFound(format!("Item {}", id)));
        }

        let mut qb = SqlBuilder::update(ITEMS_TABLE);
        if let Some(ref name) = changes.name {
            qb.set("name", text(name));
        }
        if let Some(quantity) = changes.quantity {
            qb.set("quantity", SqlValue::Double(quantity));
        }
        if let Some(price) = changes.price {
            qb.set("price", SqlValue::Double(price));
        }
        if let Some(completed) = changes.completed {
            qb.set("completed", SqlValue::Boolean(completed));
        }
        qb.set("updated_at", text(&now_text()));
        qb.where_eq("id", id);

        let (sql, params) = qb.build();
        self.conn.run(&sql, &params)?;
        log::debug!("local: updated item {}", id);

        self.get_item(id)?
            .ok_or_else(|| ShoplistError::NotFound(format!("Item {}", id)))
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let (sql, params) = SqlBuilder::delete(ITEMS_TABLE).where_eq("id", id).build();
        let affected = self.conn.run(&sql, &params)?;
        log::debug!("local: deleted item {} ({} rows)", id, affected);
        Ok(())
    }

    fn reorder_items(&self, list_id: &str, ordered_ids: &[String]) -> Result<()> {
        self.conn.in_transaction(|conn| {
            for (index, id) in ordered_ids.iter().enumerate() {
                let (sql, params) = SqlBuilder::update(ITEMS_TABLE)
                    .set("position", SqlValue::BigInt(index as i64))
                    .where_eq("id", id)
                    .where_eq("list_id", list_id)
                    .build();
                if conn.run(&sql, &params)? == 0 {
                    return Err(ShoplistError::NotFound(format!(
                        "Item {} in list {}",
                        id, list_id
                    )));
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_as_text() {
        let a = now_text();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_text();
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
