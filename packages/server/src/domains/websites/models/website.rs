use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use url::Url;

use crate::common::WebsiteId;

/// Website - a site the dashboard can select for scraping (reference data, read-only to jobs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Website {
    pub id: WebsiteId,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A website about to be inserted (seeding, admin tooling).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewWebsite {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewWebsite {
    /// Name derived from the URL's domain.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: display_name_from_url(&url),
            url,
            description: None,
        }
    }

    /// Assign id and creation time.
    pub fn into_website(self) -> Website {
        Website {
            id: WebsiteId::new(),
            name: self.name,
            url: self.url,
            description: self.description,
            created_at: Utc::now(),
        }
    }
}

/// Readable site name from a URL: `https://www.techcrunch.com/x` -> `Techcrunch`.
///
/// Falls back to "Unknown Site" when the URL has no host.
pub fn display_name_from_url(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let Some(host) = host else {
        return "Unknown Site".to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or_default();

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => "Unknown Site".to_string(),
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Website {
    /// All websites, ordered by name
    pub async fn find_all(pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Website>("SELECT * FROM websites ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    /// Websites with any of the given ids (unknown ids are simply absent)
    pub async fn find_by_ids(ids: &[WebsiteId], pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Website>("SELECT * FROM websites WHERE id = ANY($1) ORDER BY name ASC")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_url(url: &str, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Website>("SELECT * FROM websites WHERE url = $1")
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Website>(
            r#"
            INSERT INTO websites (id, name, url, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.url)
        .bind(&self.description)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
    }
}
