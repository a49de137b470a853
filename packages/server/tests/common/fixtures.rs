//! Test fixtures for creating rows directly in the store.

use chrono::Utc;
use scrape_core::common::{ScrapeJobId, ScrapeResultId, WebsiteId};
use scrape_core::domains::scraping::{
    JobPatch, JobStatus, ResultStatus, RowKind, ScrapeJob, ScrapeResult,
};
use scrape_core::kernel::BaseScrapeStore;

pub const SITE_ONE: (&str, &str) = ("Example One", "https://one.example.com");
pub const SITE_TWO: (&str, &str) = ("Example Two", "https://two.example.com");
pub const SITE_SLOW: (&str, &str) = ("Slow Site", "https://slow.example.com");

/// A job already moved to `in_progress`, as a client would leave it.
pub async fn create_in_progress_job(store: &dyn BaseScrapeStore) -> ScrapeJob {
    let job = store
        .insert_job(&ScrapeJob::new_pending())
        .await
        .expect("insert job");
    store
        .transition_job(job.id, JobStatus::Pending, &JobPatch::start())
        .await
        .expect("start job")
        .expect("job was pending")
}

/// A row written before rows carried a kind tag.
pub fn legacy_row(
    job_id: ScrapeJobId,
    website_id: WebsiteId,
    status: ResultStatus,
    title: &str,
    content: Option<&str>,
) -> ScrapeResult {
    ScrapeResult {
        id: ScrapeResultId::new(),
        job_id,
        website_id,
        kind: None,
        status,
        title: Some(title.to_string()),
        description: None,
        content: content.map(str::to_string),
        image_url: None,
        error_message: None,
        created_at: Utc::now(),
    }
}

/// Tagged task rows of a job
pub fn task_rows(rows: &[ScrapeResult]) -> Vec<&ScrapeResult> {
    rows.iter()
        .filter(|r| r.kind == Some(RowKind::Task))
        .collect()
}
