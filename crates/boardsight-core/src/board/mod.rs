//! Board data source boundary
//!
//! The agent reads two logical collections ("deals" and "work orders")
//! from an external board service. [`BoardClient`] is the seam the
//! aggregation tools run against; [`MondayClient`] is the production
//! implementation over the Monday.com GraphQL API.
//!
//! Transport failures surface as errors so a tool invocation can fail
//! loudly. A well-formed response that is merely missing the expected
//! keys degrades to empty collections instead.

pub mod normalize;

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tools::BoxFuture;

/// Maximum number of items fetched per board page
pub const PAGE_LIMIT: usize = 500;

const API_URL: &str = "https://api.monday.com/v2";
const API_VERSION: &str = "2024-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One column entry as returned by the board API
#[derive(Debug, Clone, Deserialize)]
pub struct RawColumn {
    /// Opaque column identifier
    #[serde(default)]
    pub id: String,
    /// Display text for the cell, if any
    #[serde(default)]
    pub text: Option<String>,
}

/// One board item as returned by the board API
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    /// Opaque item identifier (not retained downstream)
    #[serde(default)]
    pub id: String,
    /// Item display name
    #[serde(default)]
    pub name: String,
    /// Column entries for this item
    #[serde(default)]
    pub column_values: Vec<RawColumn>,
}

/// Read access to an external board collection
pub trait BoardClient: Send + Sync {
    /// Fetch the column id to display title lookup for a board.
    fn column_titles<'a>(
        &'a self,
        board_id: &'a str,
    ) -> BoxFuture<'a, Result<HashMap<String, String>>>;

    /// Fetch up to `limit` items from a board.
    fn items<'a>(&'a self, board_id: &'a str, limit: usize) -> BoxFuture<'a, Result<Vec<RawItem>>>;
}

/// Monday.com GraphQL client
pub struct MondayClient {
    http: reqwest::Client,
    api_key: String,
}

impl MondayClient {
    /// Create a client with a fixed request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Board(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// Run one GraphQL query and return the parsed response body.
    async fn query(&self, query: String) -> Result<Value> {
        debug!(query = %query, "board query");

        let response = self
            .http
            .post(API_URL)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .header("API-Version", API_VERSION)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| Error::Board(format!("board request failed: {e}")))?;

        let response = response
            .error_for_status()
            .map_err(|e| Error::Board(format!("board request rejected: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| Error::Board(format!("board response was not JSON: {e}")))
    }
}

impl BoardClient for MondayClient {
    fn column_titles<'a>(
        &'a self,
        board_id: &'a str,
    ) -> BoxFuture<'a, Result<HashMap<String, String>>> {
        Box::pin(async move {
            let query = format!("{{ boards(ids: [{board_id}]) {{ columns {{ id title }} }} }}");
            let result = self.query(query).await?;

            let mut titles = HashMap::new();
            let Some(columns) = result
                .pointer("/data/boards/0/columns")
                .and_then(Value::as_array)
            else {
                warn!(board_id, "column lookup missing from board response");
                return Ok(titles);
            };

            for column in columns {
                if let (Some(id), Some(title)) = (
                    column.get("id").and_then(Value::as_str),
                    column.get("title").and_then(Value::as_str),
                ) {
                    titles.insert(id.to_string(), title.to_string());
                }
            }

            debug!(board_id, count = titles.len(), "fetched column titles");
            Ok(titles)
        })
    }

    fn items<'a>(&'a self, board_id: &'a str, limit: usize) -> BoxFuture<'a, Result<Vec<RawItem>>> {
        Box::pin(async move {
            let query = format!(
                "{{ boards(ids: [{board_id}]) {{ name items_page(limit: {limit}) \
                 {{ items {{ id name column_values {{ id text }} }} }} }} }}"
            );
            let result = self.query(query).await?;

            let Some(items) = result.pointer("/data/boards/0/items_page/items") else {
                warn!(board_id, "items page missing from board response");
                return Ok(Vec::new());
            };

            match serde_json::from_value::<Vec<RawItem>>(items.clone()) {
                Ok(items) => {
                    debug!(board_id, count = items.len(), "fetched board items");
                    Ok(items)
                }
                Err(e) => {
                    warn!(board_id, error = %e, "board items were malformed");
                    Ok(Vec::new())
                }
            }
        })
    }
}
