//! Session lifecycle against a GoTrue-style auth API (e.g. Supabase Auth).
//!
//! The stores never hold sessions. [`Shoplist::sign_in`](crate::Shoplist::sign_in)
//! installs `session.access_token` on the running backend; callers pass
//! `session.user.id` to [`ListStore`](crate::store::ListStore) actions.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::backend::remote::{build_client, check_response};
use crate::config::{self, AUTH_PATH};
use crate::error::{Result, ShoplistError};
use crate::validation::Credentials;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Signup answers with either a session (auto-confirmed accounts) or the
/// bare user (confirmation e-mail pending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signup {
    SignedIn(Session),
    ConfirmationPending(AuthUser),
}

// ---------------------------------------------------------------------------
// AuthClient
// ---------------------------------------------------------------------------

pub struct AuthClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: build_client(timeout)?,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        config::join_url(&self.base_url, &format!("{}/{}", AUTH_PATH, endpoint))
    }

    /// Register a new account. Credentials are validated before any request.
    pub fn signup(&self, credentials: &Credentials) -> Result<Signup> {
        credentials.validate()?;
        log::info!("Signing up {}", credentials.email);
        let resp = check_response(
            self.client
                .post(self.url("signup"))
                .header("apikey", self.api_key.as_str())
                .json(credentials)
                .send()?,
        )?;
        let body: serde_json::Value = resp.json()?;
        if body.get("access_token").is_some() {
            return Ok(Signup::SignedIn(serde_json::from_value(body)?));
        }
        let user = match body.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => body,
        };
        Ok(Signup::ConfirmationPending(serde_json::from_value(user)?))
    }

    /// Sign in with e-mail and password.
    pub fn login(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;
        log::info!("Signing in {}", credentials.email);
        let resp = check_response(
            self.client
                .post(self.url("token"))
                .query(&[("grant_type", "password")])
                .header("apikey", self.api_key.as_str())
                .json(credentials)
                .send()?,
        )?;
        Ok(resp.json()?)
    }

    /// Revoke the session server-side.
    pub fn logout(&self, session: &Session) -> Result<()> {
        if session.access_token.is_empty() {
            return Err(ShoplistError::MissingReference(
                "session has no access token".into(),
            ));
        }
        log::info!("Signing out {}", session.user.id);
        check_response(
            self.client
                .post(self.url("logout"))
                .header("apikey", self.api_key.as_str())
                .bearer_auth(&session.access_token)
                .send()?,
        )?;
        Ok(())
    }
}
