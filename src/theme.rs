//! Persisted colour-scheme preference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::THEME_FILE;
use crate::error::{Result, ShoplistError};
use crate::state_file::StateDir;

/// Current layout of `theme.json`.
pub const THEME_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// A theme with `System` already resolved against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl Theme {
    /// Resolve at read time; `prefers_dark` is the platform colour-scheme
    /// signal and only matters for `System`.
    pub fn resolve(self, prefers_dark: bool) -> ResolvedTheme {
        match self {
            Theme::Light => ResolvedTheme::Light,
            Theme::Dark => ResolvedTheme::Dark,
            Theme::System if prefers_dark => ResolvedTheme::Dark,
            Theme::System => ResolvedTheme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ShoplistError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(ShoplistError::InvalidArgument(format!(
                "Unknown theme: {}",
                other
            ))),
        }
    }
}

/// On-disk shape of `theme.json`. Files written before versioning have no
/// `version` field and may carry an unknown or missing `theme`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTheme {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    theme: Option<serde_json::Value>,
}

impl PersistedTheme {
    fn migrate(self) -> Theme {
        match self.version {
            // Version 0 kept whatever string the UI wrote; anything
            // unrecognised falls back to System.
            0 => self
                .theme
                .and_then(|v| v.as_str().and_then(|s| s.parse().ok()))
                .unwrap_or_default(),
            _ => self
                .theme
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ThemeStore
// ---------------------------------------------------------------------------

/// Holds the raw theme preference and persists every change.
///
/// Independent of [`ListStore`](crate::store::ListStore).
#[derive(Debug)]
pub struct ThemeStore {
    theme: Theme,
    state: Option<StateDir>,
}

impl ThemeStore {
    /// In-memory store starting at `System`.
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            state: None,
        }
    }

    /// Store backed by `theme.json` in `state`; loads the saved preference.
    pub fn with_state(state: StateDir) -> Result<Self> {
        let theme = state
            .load::<PersistedTheme>(THEME_FILE)?
            .map(PersistedTheme::migrate)
            .unwrap_or_default();
        Ok(Self {
            theme,
            state: Some(state),
        })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Overwrite the preference and persist it.
    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        if let Some(ref state) = self.state {
            state.save(
                THEME_FILE,
                &PersistedTheme {
                    version: THEME_STATE_VERSION,
                    theme: Some(serde_json::Value::String(theme.as_str().to_string())),
                },
            )?;
        }
        log::debug!("Theme set to {}", theme);
        Ok(())
    }

    /// Shorthand for `self.theme().resolve(prefers_dark)`.
    pub fn resolved(&self, prefers_dark: bool) -> ResolvedTheme {
        self.theme.resolve(prefers_dark)
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}
