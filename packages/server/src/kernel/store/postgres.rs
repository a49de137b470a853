use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, StoreResult};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, ScrapeJob, ScrapeResult,
};
use crate::domains::websites::models::{NewWebsite, Website};
use crate::kernel::BaseScrapeStore;

/// Postgres-backed store; every query is defined on the model types.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseScrapeStore for PostgresStore {
    async fn list_websites(&self) -> StoreResult<Vec<Website>> {
        Ok(Website::find_all(&self.pool).await?)
    }

    async fn find_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Website::find_by_ids(ids, &self.pool).await?)
    }

    async fn find_website_by_url(&self, url: &str) -> StoreResult<Option<Website>> {
        Ok(Website::find_by_url(url, &self.pool).await?)
    }

    async fn insert_website(&self, website: NewWebsite) -> StoreResult<Website> {
        website
            .into_website()
            .insert(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Constraint(db.message().to_string())
                }
                other => StoreError::Database(other),
            })
    }

    async fn insert_job(&self, job: &ScrapeJob) -> StoreResult<ScrapeJob> {
        Ok(job.insert(&self.pool).await?)
    }

    async fn find_job(&self, id: ScrapeJobId) -> StoreResult<Option<ScrapeJob>> {
        Ok(ScrapeJob::find_by_id(id, &self.pool).await?)
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<ScrapeJob>> {
        Ok(ScrapeJob::find_recent(limit, &self.pool).await?)
    }

    async fn jobs_with_status(&self, status: JobStatus) -> StoreResult<Vec<ScrapeJob>> {
        Ok(ScrapeJob::find_by_status(status, &self.pool).await?)
    }

    async fn transition_job(
        &self,
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
    ) -> StoreResult<Option<ScrapeJob>> {
        Ok(ScrapeJob::transition(id, from, patch, &self.pool).await?)
    }

    async fn insert_results(&self, rows: &[ScrapeResult]) -> StoreResult<Vec<ScrapeResult>> {
        Ok(ScrapeResult::insert_all(rows, &self.pool).await?)
    }

    async fn results_for_job(&self, job_id: ScrapeJobId) -> StoreResult<Vec<ScrapeResult>> {
        Ok(ScrapeResult::find_by_job(job_id, &self.pool).await?)
    }

    async fn transition_result(
        &self,
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
    ) -> StoreResult<Option<ScrapeResult>> {
        Ok(ScrapeResult::transition(job_id, website_id, from, patch, &self.pool).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
