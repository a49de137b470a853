use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, RowKind, ScrapeJob, ScrapeResult,
};
use crate::domains::websites::models::{NewWebsite, Website};
use crate::kernel::BaseScrapeStore;

#[derive(Default)]
struct Tables {
    websites: Vec<Website>,
    jobs: Vec<ScrapeJob>,
    results: Vec<ScrapeResult>,
}

/// In-memory store (for testing and local runs).
///
/// Rows keep insertion order, which stands in for `created_at` ordering.
/// Transitions hold the write lock, so compare-and-set is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with websites built from `(name, url)` pairs.
    pub fn with_websites<I, N, U>(websites: I) -> Self
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: Into<String>,
    {
        let websites = websites
            .into_iter()
            .map(|(name, url)| {
                NewWebsite {
                    name: name.into(),
                    url: url.into(),
                    description: None,
                }
                .into_website()
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                websites,
                ..Tables::default()
            }),
        }
    }
}

#[async_trait]
impl BaseScrapeStore for MemoryStore {
    async fn list_websites(&self) -> StoreResult<Vec<Website>> {
        let tables = self.tables.read().await;
        let mut websites = tables.websites.clone();
        websites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(websites)
    }

    async fn find_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>> {
        let tables = self.tables.read().await;
        let mut websites: Vec<Website> = tables
            .websites
            .iter()
            .filter(|w| ids.contains(&w.id))
            .cloned()
            .collect();
        websites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(websites)
    }

    async fn find_website_by_url(&self, url: &str) -> StoreResult<Option<Website>> {
        let tables = self.tables.read().await;
        Ok(tables.websites.iter().find(|w| w.url == url).cloned())
    }

    async fn insert_website(&self, website: NewWebsite) -> StoreResult<Website> {
        let mut tables = self.tables.write().await;
        if tables.websites.iter().any(|w| w.url == website.url) {
            return Err(StoreError::Constraint(format!(
                "website url {} already exists",
                website.url
            )));
        }
        let website = website.into_website();
        tables.websites.push(website.clone());
        Ok(website)
    }

    async fn insert_job(&self, job: &ScrapeJob) -> StoreResult<ScrapeJob> {
        let mut tables = self.tables.write().await;
        tables.jobs.push(job.clone());
        Ok(job.clone())
    }

    async fn find_job(&self, id: ScrapeJobId) -> StoreResult<Option<ScrapeJob>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<ScrapeJob>> {
        let tables = self.tables.read().await;
        let mut jobs = tables.jobs.clone();
        // Stable sort; ties fall back to newest insert first
        jobs.reverse();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn jobs_with_status(&self, status: JobStatus) -> StoreResult<Vec<ScrapeJob>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .iter()
            .filter(|j| j.status == status)
            .cloned()
            .collect())
    }

    async fn transition_job(
        &self,
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
    ) -> StoreResult<Option<ScrapeJob>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == from)
            .map(|job| {
                patch.apply(job);
                job.clone()
            }))
    }

    async fn insert_results(&self, rows: &[ScrapeResult]) -> StoreResult<Vec<ScrapeResult>> {
        let mut tables = self.tables.write().await;
        tables.results.extend_from_slice(rows);
        Ok(rows.to_vec())
    }

    async fn results_for_job(&self, job_id: ScrapeJobId) -> StoreResult<Vec<ScrapeResult>> {
        let tables = self.tables.read().await;
        Ok(tables
            .results
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn transition_result(
        &self,
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
    ) -> StoreResult<Option<ScrapeResult>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .results
            .iter_mut()
            .find(|r| {
                r.job_id == job_id
                    && r.website_id == website_id
                    && r.kind == Some(RowKind::Task)
                    && r.status == from
            })
            .map(|row| {
                patch.apply(row);
                row.clone()
            }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryStore::with_websites([("Example", "https://example.com")]);
        let website = store.list_websites().await.unwrap().remove(0);
        let job = store.insert_job(&ScrapeJob::new_pending()).await.unwrap();
        store.insert_placeholders(job.id, &[website.id]).await.unwrap();

        let first = store
            .transition_result(job.id, website.id, ResultStatus::Pending, &ResultPatch::in_progress())
            .await
            .unwrap();
        let second = store
            .transition_result(job.id, website.id, ResultStatus::Pending, &ResultPatch::in_progress())
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_url_is_rejected() {
        let store = MemoryStore::new();
        store
            .insert_website(NewWebsite::from_url("https://example.com"))
            .await
            .unwrap();
        let err = store
            .insert_website(NewWebsite::from_url("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_websites_are_sorted_by_name() {
        let store = MemoryStore::with_websites([
            ("Zeta", "https://zeta.example"),
            ("Alpha", "https://alpha.example"),
        ]);
        let names: Vec<String> = store
            .list_websites()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
