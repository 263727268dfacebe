//! SQL builder with parameterized query construction.
//!
//! All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
//! never through string interpolation. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use shoplist::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("list_items")
//!     .where_eq("list_id", "list-1")
//!     .order_by(&["position ASC", "created_at ASC"])
//!     .build();
//! ```

/// A bound parameter value.
pub use duckdb::types::Value as SqlValue;

/// Wrap a string as a bound text parameter.
pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Select,
    Update,
    Delete,
}

/// Builds parameterized SELECT, UPDATE and DELETE statements.
///
/// SET parameters always precede WHERE parameters in the returned list, so
/// callers can mix [`set`](Self::set) and `where_*` calls in any order.
pub struct SqlBuilder {
    kind: StatementKind,
    select_cols: Vec<String>,
    table: String,
    set_clauses: Vec<String>,
    set_params: Vec<SqlValue>,
    where_clauses: Vec<String>,
    where_params: Vec<SqlValue>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    fn with_kind(kind: StatementKind, table: &str) -> Self {
        Self {
            kind,
            select_cols: vec!["*".to_string()],
            table: table.to_string(),
            set_clauses: Vec::new(),
            set_params: Vec::new(),
            where_clauses: Vec::new(),
            where_params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Create a SELECT builder targeting the given table.
    pub fn new(table: &str) -> Self {
        Self::with_kind(StatementKind::Select, table)
    }

    /// Create an UPDATE builder targeting the given table.
    pub fn update(table: &str) -> Self {
        Self::with_kind(StatementKind::Update, table)
    }

    /// Create a DELETE builder targeting the given table.
    pub fn delete(table: &str) -> Self {
        Self::with_kind(StatementKind::Delete, table)
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a `{column} = ?` assignment to an UPDATE.
    pub fn set(&mut self, column: &str, value: SqlValue) -> &mut Self {
        self.set_clauses.push(format!("{} = ?", column));
        self.set_params.push(value);
        self
    }


    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.where_params.push(text(value));
        self
    }


    /// Add ORDER BY clauses (e.g. `"created_at DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }


    /// Build the final SQL string and parameter list.
    ///
    /// ORDER BY and LIMIT only apply to SELECT statements.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let mut parts = match self.kind {
            StatementKind::Select => vec![
                format!("SELECT {}", self.select_cols.join(", ")),
                format!("FROM {}", self.table),
            ],
            StatementKind::Update => vec![
                format!("UPDATE {}", self.table),
                format!("SET {}", self.set_clauses.join(", ")),
            ],
            StatementKind::Delete => vec![format!("DELETE FROM {}", self.table)],
        };

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if self.kind == StatementKind::Select {
            if !self.order_by_cols.is_empty() {
                parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
            }

            if let Some(n) = self.limit_val {
                parts.push(format!("LIMIT {}", n));
            }
        }

        let mut params = self.set_params.clone();
        params.extend(self.where_params.iter().cloned());
        (parts.join("\n"), params)
    }
}
