use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{ScrapeJobId, ScrapeResultId, WebsiteId};

/// Per-row status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scrape_result_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Pending => "pending",
            ResultStatus::InProgress => "in_progress",
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResultStatus::Success | ResultStatus::Failed)
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a result row represents.
///
/// `Task` rows track one site's scan; `Content` rows list discovered items.
/// Rows written before the tag existed have no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scrape_row_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Task,
    Content,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Task => "task",
            RowKind::Content => "content",
        }
    }
}

/// Scrape result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapeResult {
    pub id: ScrapeResultId,
    pub job_id: ScrapeJobId,
    pub website_id: WebsiteId,
    #[serde(default)]
    pub kind: Option<RowKind>,
    pub status: ResultStatus,
    pub title: Option<String>,
    /// Fetched page URL on task rows, free text elsewhere
    pub description: Option<String>,
    /// Extracted snippet on task rows, status message on legacy rows
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScrapeResult {
    /// Empty `pending` task row for one (job, website) pair.
    pub fn placeholder(job_id: ScrapeJobId, website_id: WebsiteId) -> Self {
        Self {
            id: ScrapeResultId::new(),
            job_id,
            website_id,
            kind: Some(RowKind::Task),
            status: ResultStatus::Pending,
            title: None,
            description: None,
            content: None,
            image_url: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

/// What one successful site scrape produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ScrapeOutcome {
    /// URL actually fetched (after redirects)
    #[builder(setter(into))]
    pub url: String,
    #[builder(setter(into))]
    pub title: String,
    #[builder(default, setter(strip_option, into))]
    pub snippet: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub image_url: Option<String>,
}

/// Fields written by a result row transition. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultPatch {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ResultPatch {
    fn status_only(status: ResultStatus) -> Self {
        Self {
            status,
            title: None,
            description: None,
            content: None,
            image_url: None,
            error_message: None,
        }
    }

    pub fn in_progress() -> Self {
        Self::status_only(ResultStatus::InProgress)
    }

    pub fn success(outcome: ScrapeOutcome) -> Self {
        Self {
            status: ResultStatus::Success,
            title: Some(outcome.title),
            description: Some(outcome.url),
            content: outcome.snippet,
            image_url: outcome.image_url,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::status_only(ResultStatus::Failed)
        }
    }

    pub fn apply(&self, row: &mut ScrapeResult) {
        row.status = self.status;
        let fields = [
            (&mut row.title, &self.title),
            (&mut row.description, &self.description),
            (&mut row.content, &self.content),
            (&mut row.image_url, &self.image_url),
            (&mut row.error_message, &self.error_message),
        ];
        for (target, value) in fields {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ScrapeResult {
    /// Insert placeholder rows in one transaction, preserving selection order.
    pub async fn insert_all(rows: &[ScrapeResult], pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let stored = sqlx::query_as::<_, ScrapeResult>(
                r#"
                INSERT INTO scrape_results (
                    id, job_id, website_id, kind, status, title, description,
                    content, image_url, error_message, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
                "#,
            )
            .bind(row.id)
            .bind(row.job_id)
            .bind(row.website_id)
            .bind(row.kind)
            .bind(row.status)
            .bind(&row.title)
            .bind(&row.description)
            .bind(&row.content)
            .bind(&row.image_url)
            .bind(&row.error_message)
            .bind(row.created_at)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(stored);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// All rows of a job in creation order
    pub async fn find_by_job(job_id: ScrapeJobId, pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, ScrapeResult>(
            "SELECT * FROM scrape_results WHERE job_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }

    /// Compare-and-set transition of the task row for (job, website).
    ///
    /// Returns `None` when the row is not in `from` (someone else owns it).
    pub async fn transition(
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, ScrapeResult>(
            r#"
            UPDATE scrape_results
            SET status = $4,
                title = COALESCE($5, title),
                description = COALESCE($6, description),
                content = COALESCE($7, content),
                image_url = COALESCE($8, image_url),
                error_message = COALESCE($9, error_message)
            WHERE job_id = $1 AND website_id = $2 AND kind = 'task' AND status = $3
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(website_id)
        .bind(from)
        .bind(patch.status)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.content)
        .bind(&patch.image_url)
        .bind(&patch.error_message)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_pending_task_row() {
        let row = ScrapeResult::placeholder(ScrapeJobId::new(), WebsiteId::new());
        assert_eq!(row.kind, Some(RowKind::Task));
        assert_eq!(row.status, ResultStatus::Pending);
        assert!(row.title.is_none() && row.content.is_none() && row.error_message.is_none());
    }

    #[test]
    fn test_success_patch_maps_outcome_fields() {
        let outcome = ScrapeOutcome::builder()
            .url("https://example.com/")
            .title("Example Domain")
            .snippet("An illustrative page")
            .build();

        let mut row = ScrapeResult::placeholder(ScrapeJobId::new(), WebsiteId::new());
        ResultPatch::success(outcome).apply(&mut row);

        assert_eq!(row.status, ResultStatus::Success);
        assert_eq!(row.title.as_deref(), Some("Example Domain"));
        assert_eq!(row.description.as_deref(), Some("https://example.com/"));
        assert_eq!(row.content.as_deref(), Some("An illustrative page"));
        assert!(row.image_url.is_none());
    }

    #[test]
    fn test_failed_patch_serializes_only_status_and_message() {
        let json = serde_json::to_value(ResultPatch::failed("HTTP 503")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failed", "error_message": "HTTP 503"})
        );
    }

    #[test]
    fn test_legacy_row_without_kind_deserializes() {
        let json = serde_json::json!({
            "id": ScrapeResultId::new(),
            "job_id": ScrapeJobId::new(),
            "website_id": WebsiteId::new(),
            "status": "success",
            "title": "Scanned Example",
            "description": null,
            "content": "Added 3 articles",
            "image_url": null,
            "error_message": null,
            "created_at": "2024-05-01T10:00:00Z"
        });
        let row: ScrapeResult = serde_json::from_value(json).unwrap();
        assert!(row.kind.is_none());
    }
}
