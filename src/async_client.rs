//! Async wrapper around [`Shoplist`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every store action on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! DuckDB queries or blocking HTTP calls are in flight.
//!
//! # Example
//!
//! ```no_run
//! use shoplist::AsyncShoplist;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = AsyncShoplist::builder().in_memory().build().await.unwrap();
//!
//!     app.run(|s| s.lists_mut().fetch_lists("user-1")).await.unwrap();
//!     let count = app.run(|s| Ok(s.lists().lists().len())).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config;
use crate::error::{Result, ShoplistError};
use crate::models::ListStats;
use crate::Shoplist;

// ---------------------------------------------------------------------------
// AsyncShoplistBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncShoplist`] instance.
pub struct AsyncShoplistBuilder {
    data_dir: Option<PathBuf>,
    in_memory: bool,
    remote: Option<(String, String)>,
    access_token: Option<String>,
    timeout: Duration,
    persist_state: bool,
}

impl Default for AsyncShoplistBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            in_memory: false,
            remote: None,
            access_token: None,
            timeout: config::DEFAULT_TIMEOUT,
            persist_state: true,
        }
    }
}

impl AsyncShoplistBuilder {
    /// Set a custom data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use an in-memory DuckDB database.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Use the remote REST API at `url`.
    pub fn remote(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.remote = Some((url.into(), api_key.into()));
        self
    }

    /// Signed-in user's access token for the remote backend.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the HTTP request timeout for remote calls.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persist filter, selection and theme in the data directory.
    pub fn persist_state(mut self, persist: bool) -> Self {
        self.persist_state = persist;
        self
    }

    /// Build the async wrapper.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncShoplist> {
        tokio::task::spawn_blocking(move || {
            let mut builder = Shoplist::builder()
                .timeout(self.timeout)
                .persist_state(self.persist_state);
            if let Some(dir) = self.data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some((url, key)) = self.remote {
                builder = builder.remote(url, key);
            } else if self.in_memory {
                builder = builder.in_memory();
            }
            if let Some(token) = self.access_token {
                builder = builder.access_token(token);
            }
            let app = builder.build()?;
            Ok(AsyncShoplist {
                inner: Arc::new(Mutex::new(app)),
            })
        })
        .await
        .map_err(|e| ShoplistError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncShoplist
// ---------------------------------------------------------------------------

/// Async wrapper around [`Shoplist`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The wrapped [`Shoplist`] sits behind a
/// [`Mutex`], so overlapping actions run one after another in lock order.
#[derive(Clone)]
pub struct AsyncShoplist {
    inner: Arc<Mutex<Shoplist>>,
}

impl AsyncShoplist {
    /// Create a new builder for configuring the async wrapper.
    pub fn builder() -> AsyncShoplistBuilder {
        AsyncShoplistBuilder::default()
    }

    /// Wrap an already built [`Shoplist`].
    pub fn from_shoplist(app: Shoplist) -> Self {
        Self {
            inner: Arc::new(Mutex::new(app)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// The closure receives `&mut Shoplist` and should return a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Shoplist) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let app = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = app
                .lock()
                .map_err(|_| ShoplistError::InvalidArgument("Store lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| ShoplistError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Load the lists of `user_id`.
    pub async fn fetch_lists(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.run(move |s| s.lists_mut().fetch_lists(&user_id)).await
    }

    /// Load the items of `list_id`.
    pub async fn fetch_items(&self, list_id: &str) -> Result<()> {
        let list_id = list_id.to_string();
        self.run(move |s| s.lists_mut().fetch_items(&list_id)).await
    }

    /// Current derived stats.
    pub async fn stats(&self) -> Result<ListStats> {
        self.run(|s| Ok(*s.lists().stats())).await
    }
}
