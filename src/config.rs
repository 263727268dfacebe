use std::path::PathBuf;
use std::time::Duration;

pub const LISTS_TABLE: &str = "shopping_lists";
pub const ITEMS_TABLE: &str = "list_items";

pub const DATABASE_FILE: &str = "shoplist.duckdb";
pub const LIST_STATE_FILE: &str = "list-store.json";
pub const THEME_FILE: &str = "theme.json";

/// PostgREST table endpoint prefix.
pub const REST_PATH: &str = "/rest/v1";
/// GoTrue auth endpoint prefix.
pub const AUTH_PATH: &str = "/auth/v1";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_DATA_DIR: &str = "SHOPLIST_DATA_DIR";
pub const ENV_REMOTE_URL: &str = "SHOPLIST_REMOTE_URL";
pub const ENV_API_KEY: &str = "SHOPLIST_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "SHOPLIST_ACCESS_TOKEN";

/// Field limits shared by the validation layer.
pub const NAME_MAX_CHARS: usize = 100;
pub const MONEY_MAX: f64 = 999_999.99;
pub const QUANTITY_MIN: f64 = 0.01;
pub const QUANTITY_MAX: f64 = 9999.0;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 100;

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("shoplist")
    } else {
        PathBuf::from(".shoplist-data")
    }
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
