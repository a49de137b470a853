use async_trait::async_trait;
use postgrest_client::{Order, PostgrestClient, PostgrestError, Query};

use super::{StoreError, StoreResult};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, RowKind, ScrapeJob, ScrapeResult,
};
use crate::domains::websites::models::{NewWebsite, Website};
use crate::kernel::BaseScrapeStore;

const WEBSITES: &str = "websites";
const JOBS: &str = "scrape_jobs";
const RESULTS: &str = "scrape_results";

/// Store backed by a hosted PostgREST endpoint (Supabase).
///
/// The hosted schema must match `migrations/`; nothing is migrated from here.
pub struct RestStore {
    client: PostgrestClient,
}

impl RestStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

fn first<T>(rows: Vec<T>, what: &str) -> StoreResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::MissingRow(what.to_string()))
}

#[async_trait]
impl BaseScrapeStore for RestStore {
    async fn list_websites(&self) -> StoreResult<Vec<Website>> {
        Ok(self
            .client
            .select(WEBSITES, &Query::new().order_by("name", Order::Asc))
            .await?)
    }

    async fn find_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .in_list("id", ids.iter())
            .order_by("name", Order::Asc);
        Ok(self.client.select(WEBSITES, &query).await?)
    }

    async fn find_website_by_url(&self, url: &str) -> StoreResult<Option<Website>> {
        let rows: Vec<Website> = self
            .client
            .select(WEBSITES, &Query::new().eq("url", url).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_website(&self, website: NewWebsite) -> StoreResult<Website> {
        let website = website.into_website();
        let rows = self
            .client
            .insert(WEBSITES, &[&website])
            .await
            .map_err(|e| match e {
                // PostgREST answers 409 for unique violations
                PostgrestError::Api { status: 409, message } => StoreError::Constraint(message),
                other => StoreError::Rest(other),
            })?;
        first(rows, "website insert")
    }

    async fn insert_job(&self, job: &ScrapeJob) -> StoreResult<ScrapeJob> {
        let rows = self.client.insert(JOBS, &[job]).await?;
        first(rows, "job insert")
    }

    async fn find_job(&self, id: ScrapeJobId) -> StoreResult<Option<ScrapeJob>> {
        let rows: Vec<ScrapeJob> = self
            .client
            .select(JOBS, &Query::new().eq("id", id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<ScrapeJob>> {
        let query = Query::new()
            .order_by("started_at", Order::Desc)
            .limit(limit);
        Ok(self.client.select(JOBS, &query).await?)
    }

    async fn jobs_with_status(&self, status: JobStatus) -> StoreResult<Vec<ScrapeJob>> {
        let query = Query::new()
            .eq("status", status.as_str())
            .order_by("started_at", Order::Asc);
        Ok(self.client.select(JOBS, &query).await?)
    }

    async fn transition_job(
        &self,
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
    ) -> StoreResult<Option<ScrapeJob>> {
        let query = Query::new().eq("id", id).eq("status", from.as_str());
        let rows: Vec<ScrapeJob> = self.client.update(JOBS, patch, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_results(&self, rows: &[ScrapeResult]) -> StoreResult<Vec<ScrapeResult>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.client.insert(RESULTS, rows).await?)
    }

    async fn results_for_job(&self, job_id: ScrapeJobId) -> StoreResult<Vec<ScrapeResult>> {
        let query = Query::new()
            .eq("job_id", job_id)
            .order_by("created_at", Order::Asc);
        Ok(self.client.select(RESULTS, &query).await?)
    }

    async fn transition_result(
        &self,
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
    ) -> StoreResult<Option<ScrapeResult>> {
        let query = Query::new()
            .eq("job_id", job_id)
            .eq("website_id", website_id)
            .eq("kind", RowKind::Task.as_str())
            .eq("status", from.as_str());
        let rows: Vec<ScrapeResult> = self.client.update(RESULTS, patch, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn ping(&self) -> StoreResult<()> {
        let _: Vec<serde_json::Value> = self
            .client
            .select(WEBSITES, &Query::new().limit(1))
            .await?;
        Ok(())
    }
}
