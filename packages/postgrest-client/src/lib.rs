//! Pure PostgREST REST client.
//!
//! A minimal client for PostgREST-compatible record stores (Supabase exposes
//! one at `{project}/rest/v1`). It covers three calls: insert rows, update rows
//! matching an equality filter, and select rows with filter/order/limit.
//!
//! # Example
//!
//! ```rust,ignore
//! use postgrest_client::{Order, PostgrestClient, Query};
//!
//! let client = PostgrestClient::new("https://project.supabase.co", "service-key");
//!
//! let rows: Vec<Website> = client
//!     .select("websites", &Query::new().order_by("name", Order::Asc))
//!     .await?;
//! ```

pub mod error;
pub mod query;

pub use error::{PostgrestError, Result};
pub use query::{Order, Query};

use serde::de::DeserializeOwned;
use serde::Serialize;

const REST_PATH: &str = "rest/v1";

pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    /// `base_url` is the project root (the client appends `/rest/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Insert one or more rows and return them as stored (with generated columns).
    pub async fn insert<T, R>(&self, table: &str, rows: &T) -> Result<Vec<R>>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(table, "PostgREST insert");
        let resp = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        Self::decode_rows(resp).await
    }

    /// Apply `patch` to every row matching `query` and return the affected rows.
    ///
    /// An empty result means nothing matched, which callers use for
    /// conditional (compare-and-set) transitions.
    pub async fn update<P, R>(&self, table: &str, patch: &P, query: &Query) -> Result<Vec<R>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if !query.has_filter() {
            return Err(PostgrestError::Api {
                status: 400,
                message: format!("refusing unfiltered update on {}", table),
            });
        }

        tracing::debug!(table, "PostgREST update");
        let resp = self
            .request(reqwest::Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&query.to_params())
            .json(patch)
            .send()
            .await?;

        Self::decode_rows(resp).await
    }

    /// Select rows matching `query`.
    pub async fn select<R: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<R>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());

        let resp = self
            .request(reqwest::Method::GET, table)
            .query(&params)
            .send()
            .await?;

        Self::decode_rows(resp).await
    }

    async fn decode_rows<R: DeserializeOwned>(resp: reqwest::Response) -> Result<Vec<R>> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(PostgrestError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
