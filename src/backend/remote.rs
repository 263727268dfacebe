//! Remote backend over a PostgREST-style REST API (e.g. Supabase).
//!
//! Tables are addressed as `{base}/rest/v1/{table}`; rows are filtered with
//! `column=eq.value` query parameters and ordered with `order=col.dir`.
//! Inserts and updates ask for `Prefer: return=representation` so the
//! server sends back the full row.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Backend;
use crate::config::{self, ITEMS_TABLE, LISTS_TABLE, REST_PATH};
use crate::error::{Result, ShoplistError};
use crate::models::{ItemUpdate, ListItem, NewItem, NewList, ShoppingList};

const RETURN_REPRESENTATION: &str = "return=representation";

/// Turn a non-2xx response into [`ShoplistError::Backend`].
///
/// The message is taken from the JSON body (`message`, `msg`,
/// `error_description` or `error`, in that order) and falls back to the raw
/// body text.
pub(crate) fn check_response(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.trim().to_string()
            }
        });
    Err(ShoplistError::Backend {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[derive(Serialize)]
struct ItemInsert<'a> {
    #[serde(flatten)]
    item: &'a NewItem,
    completed: bool,
    position: i64,
}

#[derive(Serialize)]
struct ItemPatch<'a> {
    #[serde(flatten)]
    changes: &'a ItemUpdate,
    updated_at: String,
}

#[derive(Serialize)]
struct PositionPatch {
    position: i64,
}

#[derive(Deserialize)]
struct PositionRow {
    position: Option<i64>,
}

// ---------------------------------------------------------------------------
// RemoteBackend
// ---------------------------------------------------------------------------

/// [`Backend`] talking to a remote relational REST API.
///
/// Requests carry the project `apikey` header and a bearer token: the
/// signed-in user's access token when one is set, the api key otherwise.
pub struct RemoteBackend {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: Client,
}

impl RemoteBackend {
    /// Create a backend for the API at `base_url`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
            client: build_client(timeout)?,
        })
    }

    /// Authenticate subsequent requests as the signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        config::join_url(&self.base_url, &format!("{}/{}", REST_PATH, table))
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, self.table_url(table))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(bearer)
    }

    /// Send a request that returns rows, decode them.
    fn rows<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Vec<T>> {
        let resp = check_response(req.send()?)?;
        Ok(resp.json()?)
    }

    /// Send an insert/update and return the single representation row.
    fn single<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let rows: Vec<T> = self.rows(req.header("Prefer", RETURN_REPRESENTATION))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ShoplistError::NotFound(what.to_string()))
    }

    fn next_position(&self, list_id: &str) -> Result<i64> {
        let filter = eq(list_id);
        let rows: Vec<PositionRow> = self.rows(self.request(Method::GET, ITEMS_TABLE).query(&[
            ("select", "position"),
            ("list_id", filter.as_str()),
            ("order", "position.desc.nullslast"),
            ("limit", "1"),
        ]))?;
        Ok(rows
            .first()
            .and_then(|r| r.position)
            .map(|p| p + 1)
            .unwrap_or(0))
    }
}

impl Backend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn fetch_lists(&self, user_id: &str) -> Result<Vec<ShoppingList>> {
        log::debug!("remote: fetch lists for {}", user_id);
        let filter = eq(user_id);
        self.rows(self.request(Method::GET, LISTS_TABLE).query(&[
            ("select", "*"),
            ("user_id", filter.as_str()),
            ("order", "created_at.desc"),
        ]))
    }

    fn create_list(&self, list: &NewList) -> Result<ShoppingList> {
        log::debug!("remote: create list {:?}", list.name);
        self.single(
            self.request(Method::POST, LISTS_TABLE).json(list),
            "created list representation",
        )
    }

    fn delete_list(&self, id: &str) -> Result<()> {
        log::debug!("remote: delete list {}", id);
        check_response(
            self.request(Method::DELETE, ITEMS_TABLE)
                .query(&[("list_id", eq(id))])
                .send()?,
        )?;
        check_response(
            self.request(Method::DELETE, LISTS_TABLE)
                .query(&[("id", eq(id))])
                .send()?,
        )?;
        Ok(())
    }

    fn fetch_items(&self, list_id: &str) -> Result<Vec<ListItem>> {
        log::debug!("remote: fetch items for {}", list_id);
        let filter = eq(list_id);
        self.rows(self.request(Method::GET, ITEMS_TABLE).query(&[
            ("select", "*"),
            ("list_id", filter.as_str()),
            ("order", "position.asc,created_at.asc"),
        ]))
    }

    fn add_item(&self, item: &NewItem) -> Result<ListItem> {
        let position = self.next_position(&item.list_id)?;
        log::debug!("remote: add item {:?} at {}", item.name, position);
        let body = ItemInsert {
            item,
            completed: false,
            position,
        };
        self.single(
            self.request(Method::POST, ITEMS_TABLE).json(&body),
            "created item representation",
        )
    }

    fn update_item(&self, id: &str, changes: &ItemUpdate) -> Result<ListItem> {
        log::debug!("remote: update item {}", id);
        let body = ItemPatch {
            changes,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        self.single(
            self.request(Method::PATCH, ITEMS_TABLE)
                .query(&[("id", eq(id))])
                .json(&body),
            &format!("Item {}", id),
        )
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        log::debug!("remote: delete item {}", id);
        check_response(
            self.request(Method::DELETE, ITEMS_TABLE)
                .query(&[("id", eq(id))])
                .send()?,
        )?;
        Ok(())
    }

    fn set_access_token(&mut self, token: Option<String>) {
        log::debug!(
            "remote: {} access token",
            if token.is_some() { "installing" } else { "dropping" }
        );
        self.access_token = token;
    }

    /// One PATCH per item; not atomic across items.
    fn reorder_items(&self, list_id: &str, ordered_ids: &[String]) -> Result<()> {
        log::debug!("remote: reorder {} items in {}", ordered_ids.len(), list_id);
        for (index, id) in ordered_ids.iter().enumerate() {
            let _: ListItem = self.single(
                self.request(Method::PATCH, ITEMS_TABLE)
                    .query(&[("id", eq(id)), ("list_id", eq(list_id))])
                    .json(&PositionPatch {
                        position: index as i64,
                    }),
                &format!("Item {} in list {}", id, list_id),
            )?;
        }
        Ok(())
    }
}
