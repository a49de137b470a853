// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Job sequencing lives in domains/scraping/actions and only talks to these traits.
//
// Naming convention: Base* for trait names (e.g., BaseScraper, BaseScrapeStore)

use async_trait::async_trait;

use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::error::SiteScrapeError;
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, ScrapeJob, ScrapeOutcome, ScrapeResult,
};
use crate::domains::websites::models::{NewWebsite, Website};
use crate::kernel::store::StoreResult;

// =============================================================================
// Scraper Trait (Infrastructure - one fetch + extract per site)
// =============================================================================

#[async_trait]
pub trait BaseScraper: Send + Sync {
    /// Perform one scrape attempt for a website
    async fn scrape(&self, website: &Website) -> Result<ScrapeOutcome, SiteScrapeError>;
}

// =============================================================================
// Record Store Trait (Infrastructure - websites, jobs, result rows)
// =============================================================================

/// Typed access to the three tables the job lifecycle uses.
///
/// Transitions are compare-and-set: they only apply when the row is currently
/// in `from`, and return `None` otherwise. That is what keeps each site's row
/// to a single claim and a single terminal write.
#[async_trait]
pub trait BaseScrapeStore: Send + Sync {
    /// All websites ordered by name
    async fn list_websites(&self) -> StoreResult<Vec<Website>>;

    /// Websites matching `ids`; unknown ids are skipped
    async fn find_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>>;

    async fn find_website_by_url(&self, url: &str) -> StoreResult<Option<Website>>;

    async fn insert_website(&self, website: NewWebsite) -> StoreResult<Website>;

    async fn insert_job(&self, job: &ScrapeJob) -> StoreResult<ScrapeJob>;

    async fn find_job(&self, id: ScrapeJobId) -> StoreResult<Option<ScrapeJob>>;

    /// Most recent jobs first
    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<ScrapeJob>>;

    async fn jobs_with_status(&self, status: JobStatus) -> StoreResult<Vec<ScrapeJob>>;

    async fn transition_job(
        &self,
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
    ) -> StoreResult<Option<ScrapeJob>>;

    /// Insert result rows as given (ids and timestamps already assigned)
    async fn insert_results(&self, rows: &[ScrapeResult]) -> StoreResult<Vec<ScrapeResult>>;

    /// Result rows for a job in creation order
    async fn results_for_job(&self, job_id: ScrapeJobId) -> StoreResult<Vec<ScrapeResult>>;

    /// Transition the task row for (job, website)
    async fn transition_result(
        &self,
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
    ) -> StoreResult<Option<ScrapeResult>>;

    /// Cheap liveness check for /health
    async fn ping(&self) -> StoreResult<()>;

    /// One `pending` task row per website, in the given order
    async fn insert_placeholders(
        &self,
        job_id: ScrapeJobId,
        website_ids: &[WebsiteId],
    ) -> StoreResult<Vec<ScrapeResult>> {
        let rows: Vec<ScrapeResult> = website_ids
            .iter()
            .map(|website_id| ScrapeResult::placeholder(job_id, *website_id))
            .collect();
        self.insert_results(&rows).await
    }
}
