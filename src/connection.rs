//! DuckDB connection wrapper: schema setup and query execution.
//!
//! Rows come back as `serde_json` maps so they can be deserialized straight
//! into the crate's models. Timestamps are stored as RFC 3339 text, money
//! and quantities as DOUBLE.

use crate::config::{ITEMS_TABLE, LISTS_TABLE};
use crate::error::{Result, ShoplistError};
use crate::sql_builder::SqlValue;
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn schema_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {lists} (\
           id VARCHAR PRIMARY KEY, \
           name VARCHAR NOT NULL, \
           budget DOUBLE NOT NULL DEFAULT 0, \
           user_id VARCHAR NOT NULL, \
           created_at VARCHAR NOT NULL, \
           updated_at VARCHAR NOT NULL\
         ); \
         CREATE TABLE IF NOT EXISTS {items} (\
           id VARCHAR PRIMARY KEY, \
           list_id VARCHAR NOT NULL, \
           name VARCHAR NOT NULL, \
           quantity DOUBLE NOT NULL, \
           price DOUBLE NOT NULL, \
           completed BOOLEAN NOT NULL DEFAULT FALSE, \
           position BIGINT NOT NULL DEFAULT 0, \
           created_at VARCHAR NOT NULL, \
           updated_at VARCHAR NOT NULL\
         );",
        lists = LISTS_TABLE,
        items = ITEMS_TABLE
    )
}

/// Columns added after the first release: `(table, column, definition)`.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[(ITEMS_TABLE, "position", "BIGINT DEFAULT 0")];

/// Wraps a DuckDB connection holding the `shopping_lists` and `list_items`
/// tables.
pub struct Connection {
    conn: DuckDbConnection,
    path: Option<PathBuf>,
}

impl Connection {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = DuckDbConnection::open(path)?;
        let this = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        this.migrate()?;
        log::info!("Opened local database at {}", path.display());
        Ok(this)
    }

    /// Open an in-memory database with the schema in place.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        let this = Self { conn, path: None };
        this.migrate()?;
        Ok(this)
    }

    /// Create missing tables and apply additive column migrations.
    ///
    /// Safe to call repeatedly.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(&schema_sql())?;
        for (table, column, definition) in ADDED_COLUMNS {
            if !self.column_exists(table, column)? {
                self.conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    table, column, definition
                ))?;
                log::info!("Migrated {}: added column {}", table, column);
            }
        }
        Ok(())
    }

    /// Check whether `table` has a column named `column`.
    pub fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let count = self.execute_scalar(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_name = ? AND column_name = ?",
            &[
                SqlValue::Text(table.to_string()),
                SqlValue::Text(column.to_string()),
            ],
        )?;
        Ok(count.and_then(|v| v.as_i64()).unwrap_or(0) > 0)
    }

    /// Backing file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available after the query has run
        let (column_names, column_count) = {
            let stmt_ref = rows_result.as_ref().ok_or_else(|| {
                ShoplistError::InvalidArgument(format!("No column metadata for: {}", sql))
            })?;
            let names: Vec<String> = stmt_ref
                .column_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            (names, stmt_ref.column_count())
        };

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::new();
            for (i, col_name) in column_names.iter().enumerate().take(column_count) {
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter().collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Execute a data-modifying statement and return the affected row count.
    pub fn run(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();
        Ok(self.conn.execute(sql, param_values.as_slice())?)
    }

    /// Run `f` inside a transaction; commits on `Ok`, rolls back on `Err`.
    pub fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("Rollback failed after {}: {}", e, rollback);
                }
                Err(e)
            }
        }
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        // Remaining types are not used by the schema
        _ => serde_json::Value::Null,
    }
}
