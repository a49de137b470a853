use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::domains::websites::models::NewWebsite;
use crate::kernel::{BaseScrapeStore, StoreError};

/// One entry of a seed file: a bare URL or a full website record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedEntry {
    Url(String),
    Website(NewWebsite),
}

impl SeedEntry {
    fn into_new_website(self) -> NewWebsite {
        match self {
            SeedEntry::Url(url) => NewWebsite::from_url(url),
            SeedEntry::Website(website) => website,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    /// URL already present
    pub skipped: usize,
    /// Not an http(s) URL
    pub invalid: usize,
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Insert websites that are not in the store yet. Existing URLs are skipped.
pub async fn seed_websites(
    store: &dyn BaseScrapeStore,
    entries: Vec<SeedEntry>,
) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    for entry in entries {
        let website = entry.into_new_website();
        if !is_http_url(&website.url) {
            warn!(url = %website.url, "Skipping invalid website URL");
            report.invalid += 1;
            continue;
        }

        if store.find_website_by_url(&website.url).await?.is_some() {
            debug!(url = %website.url, "Website already exists");
            report.skipped += 1;
            continue;
        }

        match store.insert_website(website).await {
            Ok(inserted) => {
                info!(website_id = %inserted.id, name = %inserted.name, "Website added");
                report.added += 1;
            }
            // Lost a race with another seeder
            Err(StoreError::Constraint(_)) => report.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
