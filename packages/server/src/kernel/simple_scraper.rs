//! Simple web scraper - one HTTP fetch + HTML parse per website
//!
//! This implementation:
//! - Uses reqwest for the request (browser-like headers, bounded redirects, timeout)
//! - Uses the scraper crate for HTML parsing
//! - Extracts a title, a short snippet and a lead image
//!
//! Limitations:
//! - No JavaScript rendering (static HTML only)
//! - No link following; one page per website

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::BaseScraper;
use crate::domains::scraping::error::SiteScrapeError;
use crate::domains::scraping::models::ScrapeOutcome;
use crate::domains::websites::models::Website;

/// Longest snippet kept on a result row
const SNIPPET_MAX_CHARS: usize = 280;

/// Titles that name the site section rather than the page
const GENERIC_TITLES: &[&str] = &["Home", "News", "Homepage", "Index", "Welcome"];

/// Simple web scraper using reqwest + scraper
pub struct SimpleScraper {
    client: reqwest::Client,
    timeout: Duration,
}

impl SimpleScraper {
    pub fn new(timeout: Duration) -> Result<Self, SiteScrapeError> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| SiteScrapeError::Network(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Fetch raw HTML, returning the final URL after redirects
    async fn fetch_html(&self, url: &Url) -> Result<(Url, String), SiteScrapeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| self.classify(url, e))?;
        Ok((final_url, body))
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> SiteScrapeError {
        if err.is_timeout() {
            SiteScrapeError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            SiteScrapeError::Network(err.to_string())
        }
    }

    /// Add https:// when no scheme is present, then parse
    fn normalize_url(raw: &str) -> Result<Url, SiteScrapeError> {
        let raw = raw.trim();
        let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };
        let url = Url::parse(&with_scheme).map_err(|_| SiteScrapeError::InvalidUrl(raw.to_string()))?;
        if url.host_str().is_none() {
            return Err(SiteScrapeError::InvalidUrl(raw.to_string()));
        }
        Ok(url)
    }

    fn select_text(document: &Html, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(collapse_whitespace)
            .find(|v| !v.is_empty())
    }

    /// `<title>`, then `og:title`; generic or very short titles fall back to the first `<h1>`
    fn extract_title(document: &Html) -> Option<String> {
        let title = Self::select_text(document, "title")
            .or_else(|| Self::select_attr(document, r#"meta[property="og:title"]"#, "content"));

        match title {
            Some(t) if !is_generic_title(&t) => Some(t),
            other => Self::select_text(document, "h1").or(other),
        }
    }

    /// Meta description, then `og:description`, then the first paragraph
    fn extract_snippet(document: &Html) -> Option<String> {
        Self::select_attr(document, r#"meta[name="description"]"#, "content")
            .or_else(|| Self::select_attr(document, r#"meta[property="og:description"]"#, "content"))
            .or_else(|| Self::select_text(document, "p"))
            .map(|s| truncate_chars(&s, SNIPPET_MAX_CHARS))
    }

    /// `og:image` resolved against the page URL
    fn extract_image(document: &Html, base: &Url) -> Option<String> {
        let raw = Self::select_attr(document, r#"meta[property="og:image"]"#, "content")?;
        base.join(&raw).ok().map(|u| u.to_string())
    }

    /// Turn a fetched page into an outcome; pages without any title are a parse failure
    fn parse_page(final_url: &Url, html: &str) -> Result<ScrapeOutcome, SiteScrapeError> {
        let document = Html::parse_document(html);

        let title = Self::extract_title(&document)
            .ok_or_else(|| SiteScrapeError::Parse(format!("no title found at {}", final_url)))?;

        Ok(ScrapeOutcome {
            url: final_url.to_string(),
            title,
            snippet: Self::extract_snippet(&document),
            image_url: Self::extract_image(&document, final_url),
        })
    }
}

fn is_generic_title(title: &str) -> bool {
    title.chars().count() < 5 || GENERIC_TITLES.iter().any(|g| g.eq_ignore_ascii_case(title))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

#[async_trait]
impl BaseScraper for SimpleScraper {
    async fn scrape(&self, website: &Website) -> Result<ScrapeOutcome, SiteScrapeError> {
        let url = Self::normalize_url(&website.url)?;
        debug!(website_id = %website.id, url = %url, "Scraping page");

        let (final_url, html) = self.fetch_html(&url).await?;
        Self::parse_page(&final_url, &html)
    }
}
