//! Shopping-list store for Rust.
//!
//! Keeps a user's budgeted shopping lists and their items in sync with a
//! persistence backend: either an embedded DuckDB database (file or
//! in-memory) or a remote PostgREST-style REST API. Derived statistics
//! (totals, spend, remaining budget) are recomputed after every change.
//!
//! # Quick start
//!
//! ```no_run
//! use shoplist::{NewItem, Shoplist};
//!
//! let mut app = Shoplist::builder().in_memory().persist_state(false).build().unwrap();
//! let lists = app.lists_mut();
//!
//! let list = lists.create_list("Groceries", 100.0, "user-1").unwrap();
//! lists.set_current_list(Some(list.clone())).unwrap();
//! lists.add_item(NewItem::new(&list.id, "Milk", 2.0, 3.5)).unwrap();
//!
//! assert_eq!(lists.stats().total_spent, 7.0);
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod auth;
pub mod backend;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod sql_builder;
pub mod state_file;
pub mod store;
pub mod theme;
pub mod validation;

#[cfg(feature = "async")]
pub use async_client::AsyncShoplist;
pub use auth::{AuthClient, AuthUser, Session, Signup};
pub use backend::{Backend, LocalBackend, RemoteBackend};
pub use connection::Connection;
pub use error::{Result, ShoplistError};
pub use models::{
    ExportBundle, ItemFilter, ItemUpdate, ListItem, ListStats, NewItem, NewList, ShoppingList,
};
pub use sql_builder::SqlBuilder;
pub use state_file::StateDir;
pub use store::ListStore;
pub use theme::{ResolvedTheme, Theme, ThemeStore};
pub use validation::{Credentials, ItemInput, ListInput, ValidationErrors};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Which persistence backend a [`Shoplist`] is built with. Fixed for the
/// lifetime of the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// DuckDB file `shoplist.duckdb` in the data directory.
    LocalFile,
    /// DuckDB in-memory database; nothing outlives the process.
    InMemory,
    /// Remote REST API at `url`, authenticated with the project `api_key`.
    Remote { url: String, api_key: String },
}

// ---------------------------------------------------------------------------
// ShoplistBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Shoplist`] instance.
///
/// Use [`Shoplist::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](ShoplistBuilder::build).
pub struct ShoplistBuilder {
    data_dir: Option<PathBuf>,
    backend: BackendConfig,
    access_token: Option<String>,
    timeout: Duration,
    persist_state: bool,
}

impl Default for ShoplistBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendConfig::LocalFile,
            access_token: None,
            timeout: config::DEFAULT_TIMEOUT,
            persist_state: true,
        }
    }
}

impl ShoplistBuilder {
    /// Start from environment variables.
    ///
    /// - `SHOPLIST_DATA_DIR`: data directory
    /// - `SHOPLIST_REMOTE_URL` + `SHOPLIST_API_KEY`: use the remote backend
    /// - `SHOPLIST_ACCESS_TOKEN`: signed-in user's token for the remote backend
    ///
    /// Unset variables keep the defaults.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Ok(dir) = std::env::var(config::ENV_DATA_DIR) {
            builder = builder.data_dir(dir);
        }
        if let (Ok(url), Ok(key)) = (
            std::env::var(config::ENV_REMOTE_URL),
            std::env::var(config::ENV_API_KEY),
        ) {
            builder = builder.remote(url, key);
        }
        if let Ok(token) = std::env::var(config::ENV_ACCESS_TOKEN) {
            builder = builder.access_token(token);
        }
        builder
    }

    /// Set a custom data directory.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/shoplist` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep lists and items in a DuckDB file in the data directory (default).
    pub fn local(mut self) -> Self {
        self.backend = BackendConfig::LocalFile;
        self
    }

    /// Keep lists and items in an in-memory DuckDB database.
    pub fn in_memory(mut self) -> Self {
        self.backend = BackendConfig::InMemory;
        self
    }

    /// Use the remote REST API at `url`.
    pub fn remote(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.backend = BackendConfig::Remote {
            url: url.into(),
            api_key: api_key.into(),
        };
        self
    }

    /// Signed-in user's access token, sent as bearer token by the remote
    /// backend. Ignored by local backends.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the HTTP request timeout for remote calls.
    ///
    /// Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persist filter, selection and theme in the data directory.
    ///
    /// Defaults to `true`.
    pub fn persist_state(mut self, persist: bool) -> Self {
        self.persist_state = persist;
        self
    }

    /// Build the application root: open the backend and restore any
    /// persisted state.
    pub fn build(self) -> Result<Shoplist> {
        let data_dir = self.data_dir.unwrap_or_else(config::default_data_dir);
        let state = if self.persist_state {
            Some(StateDir::new(&data_dir)?)
        } else {
            None
        };

        let mut auth = None;
        let backend: Box<dyn Backend> = match self.backend {
            BackendConfig::LocalFile => Box::new(LocalBackend::new(Connection::open(
                data_dir.join(config::DATABASE_FILE),
            )?)),
            BackendConfig::InMemory => Box::new(LocalBackend::in_memory()?),
            BackendConfig::Remote {
                ref url,
                ref api_key,
            } => {
                auth = Some(AuthClient::new(url, api_key, self.timeout)?);
                let mut remote = RemoteBackend::new(url, api_key, self.timeout)?;
                if let Some(token) = self.access_token {
                    remote = remote.with_access_token(token);
                }
                Box::new(remote)
            }
        };
        log::info!("Using {} backend", backend.name());

        let (lists, theme) = match state {
            Some(state) => (
                ListStore::with_state(backend, state.clone())?,
                ThemeStore::with_state(state)?,
            ),
            None => (ListStore::new(backend), ThemeStore::new()),
        };

        Ok(Shoplist {
            lists,
            theme,
            auth,
            data_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// Shoplist
// ---------------------------------------------------------------------------

/// Application root: owns the list store, the theme store and, for remote
/// backends, the auth client.
///
/// Created via [`Shoplist::builder()`] and handed to whatever needs it;
/// there is no global instance.
pub struct Shoplist {
    lists: ListStore,
    theme: ThemeStore,
    auth: Option<AuthClient>,
    data_dir: PathBuf,
}

impl Shoplist {
    /// Create a new builder for configuring the application.
    pub fn builder() -> ShoplistBuilder {
        ShoplistBuilder::default()
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut ListStore {
        &mut self.lists
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut ThemeStore {
        &mut self.theme
    }

    /// Auth client for the remote backend; `None` for local backends.
    pub fn auth(&self) -> Option<&AuthClient> {
        self.auth.as_ref()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn require_auth(&self) -> Result<&AuthClient> {
        self.auth.as_ref().ok_or_else(|| {
            ShoplistError::MissingReference(format!(
                "the {} backend has no auth service",
                self.lists.backend_name()
            ))
        })
    }

    /// Log in and authenticate every later backend call with the session's
    /// access token.
    pub fn sign_in(&mut self, credentials: &Credentials) -> Result<Session> {
        let session = self.require_auth()?.login(credentials)?;
        self.lists
            .set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    /// Register an account. When the server signs the user in right away,
    /// the session token is installed like [`sign_in`](Self::sign_in).
    pub fn sign_up(&mut self, credentials: &Credentials) -> Result<Signup> {
        let outcome = self.require_auth()?.signup(credentials)?;
        if let Signup::SignedIn(ref session) = outcome {
            self.lists
                .set_access_token(Some(session.access_token.clone()));
        }
        Ok(outcome)
    }

    /// Revoke the session server-side and go back to anonymous requests.
    ///
    /// The local token is dropped even when the server call fails.
    pub fn sign_out(&mut self, session: &Session) -> Result<()> {
        let result = self.require_auth()?.logout(session);
        self.lists.set_access_token(None);
        result
    }

    /// Consume the application and release the backend.
    pub fn close(self) {
        log::info!("Closing {} backend", self.lists.backend_name());
        drop(self);
    }
}

impl fmt::Display for Shoplist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shoplist(backend={}, data_dir={}, lists={}, theme={})",
            self.lists.backend_name(),
            self.data_dir.display(),
            self.lists.lists().len(),
            self.theme.theme()
        )
    }
}
