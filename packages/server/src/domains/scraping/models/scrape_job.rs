use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::ScrapeJobId;

/// Scrape job status
///
/// `pending -> in_progress -> completed | failed`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scrape_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scrape job - one batch run over a set of selected websites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapeJob {
    pub id: ScrapeJobId,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only when the job itself failed (never for per-site failures)
    pub error_message: Option<String>,
}

impl ScrapeJob {
    /// Fresh `pending` job.
    pub fn new_pending() -> Self {
        Self {
            id: ScrapeJobId::new(),
            status: JobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fields written by a job status transition.
///
/// `None` fields are left untouched by every store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPatch {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobPatch {
    pub fn start() -> Self {
        Self {
            status: JobStatus::InProgress,
            started_at: Some(Utc::now()),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn complete() -> Self {
        Self {
            status: JobStatus::Completed,
            started_at: None,
            completed_at: Some(Utc::now()),
            error_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            started_at: None,
            completed_at: Some(Utc::now()),
            error_message: Some(message.into()),
        }
    }

    pub fn apply(&self, job: &mut ScrapeJob) {
        job.status = self.status;
        if let Some(started_at) = self.started_at {
            job.started_at = started_at;
        }
        if let Some(completed_at) = self.completed_at {
            job.completed_at = Some(completed_at);
        }
        if let Some(message) = &self.error_message {
            job.error_message = Some(message.clone());
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ScrapeJob {
    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, ScrapeJob>(
            r#"
            INSERT INTO scrape_jobs (id, status, started_at, completed_at, error_message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.status)
        .bind(self.started_at)
        .bind(self.completed_at)
        .bind(&self.error_message)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(id: ScrapeJobId, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, ScrapeJob>("SELECT * FROM scrape_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent jobs first
    pub async fn find_recent(limit: usize, pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, ScrapeJob>(
            "SELECT * FROM scrape_jobs ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_status(status: JobStatus, pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, ScrapeJob>(
            "SELECT * FROM scrape_jobs WHERE status = $1 ORDER BY started_at ASC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Compare-and-set status transition. Returns `None` when the job is not in `from`.
    pub async fn transition(
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, ScrapeJob>(
            r#"
            UPDATE scrape_jobs
            SET status = $3,
                started_at = COALESCE($4, started_at),
                completed_at = COALESCE($5, completed_at),
                error_message = COALESCE($6, error_message)
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(patch.status)
        .bind(patch.started_at)
        .bind(patch.completed_at)
        .bind(&patch.error_message)
        .fetch_optional(pool)
        .await
    }
}
