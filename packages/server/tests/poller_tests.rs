//! Poller state machine driven against the in-memory store on a paused clock.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crate::common::*;
use scrape_core::common::ScrapeJobId;
use scrape_core::domains::scraping::actions::{spawn_job, start_job};
use scrape_core::domains::scraping::{
    JobStatus, PollTransportError, Poller, PollerState, ProgressSource, ProgressView,
    StoreProgressSource,
};
use scrape_core::kernel::MockScraper;

const INTERVAL: Duration = Duration::from_millis(100);

/// Counts fetches and fails the first `fail_first` of them.
struct CountingSource {
    inner: StoreProgressSource,
    fetches: Arc<AtomicUsize>,
    fail_first: usize,
}

#[async_trait]
impl ProgressSource for CountingSource {
    async fn fetch(&self, job_id: ScrapeJobId) -> Result<ProgressView, PollTransportError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(PollTransportError::Fetch("connection reset".into()));
        }
        self.inner.fetch(job_id).await
    }
}

fn poller(harness: &TestHarness, fail_first: usize) -> (Poller, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        inner: StoreProgressSource::new(harness.deps.store.clone()),
        fetches: fetches.clone(),
        fail_first,
    };
    (Poller::new(Arc::new(source), INTERVAL), fetches)
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_is_retried_until_terminal() {
    let scraper = MockScraper::new().with_delay(SITE_ONE.1, Duration::from_millis(350));
    let harness = TestHarness::new(&[SITE_ONE], scraper).await;
    let (job, websites) = start_job(&[harness.website(SITE_ONE.0).id], &harness.deps)
        .await
        .unwrap();

    let (poller, fetches) = poller(&harness, 1);
    let handle = poller.start(job.id);
    spawn_job(job.id, websites, harness.deps.clone());

    // First fetch failed; still polling, nothing to show yet
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.state(), PollerState::Polling { latest: None });

    let view = handle.wait_terminal().await.expect("poller reaches terminal");
    assert_eq!(view.job_status, JobStatus::Completed);
    assert_eq!(view.progress_percent, 100.0);
    assert!(handle.state().is_terminal());
    assert!(fetches.load(Ordering::SeqCst) >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_no_fetches_after_terminal() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let (job, websites) = start_job(&[harness.website(SITE_ONE.0).id], &harness.deps)
        .await
        .unwrap();
    spawn_job(job.id, websites, harness.deps.clone()).await.unwrap();

    let (poller, fetches) = poller(&harness, 0);
    let handle = poller.start(job.id);
    handle.wait_terminal().await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_polls_on_a_fixed_interval() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;
    let job = create_in_progress_job(harness.memory.as_ref()).await;

    let (poller, fetches) = poller(&harness, 0);
    let _handle = poller.start(job.id);

    // Immediate first fetch, then one per interval
    tokio::time::sleep(INTERVAL * 10 + Duration::from_millis(50)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 11);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_returns_to_idle_and_stops_fetching() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;
    let job = create_in_progress_job(harness.memory.as_ref()).await;

    let (poller, fetches) = poller(&harness, 0);
    let handle = poller.start(job.id);
    tokio::time::sleep(INTERVAL * 3).await;
    assert!(matches!(
        handle.state(),
        PollerState::Polling { latest: Some(_) }
    ));

    handle.cancel();
    assert_eq!(handle.state(), PollerState::Idle);
    assert!(handle.wait_terminal().await.is_none());

    let before = fetches.load(Ordering::SeqCst);
    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetches.load(Ordering::SeqCst), before);
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_fetching() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;
    let job = create_in_progress_job(harness.memory.as_ref()).await;

    let (poller, fetches) = poller(&harness, 0);
    let handle = poller.start(job.id);
    tokio::time::sleep(INTERVAL * 2).await;
    drop(handle);

    // Let the poll task observe the cancellation
    tokio::time::sleep(Duration::from_millis(1)).await;
    let before = fetches.load(Ordering::SeqCst);
    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(fetches.load(Ordering::SeqCst), before);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_job_keeps_polling() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;

    let (poller, fetches) = poller(&harness, 0);
    let handle = poller.start(ScrapeJobId::new());
    tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;

    assert_eq!(handle.state(), PollerState::Polling { latest: None });
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_still_reaches_terminal() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let (job, websites) = start_job(&[harness.website(SITE_ONE.0).id], &harness.deps)
        .await
        .unwrap();
    spawn_job(job.id, websites, harness.deps.clone()).await.unwrap();

    let source = StoreProgressSource::new(harness.deps.store.clone());
    let handle = Poller::new(Arc::new(source), Duration::ZERO).start(job.id);

    let view = tokio::time::timeout(Duration::from_secs(2), handle.wait_terminal())
        .await
        .expect("poller did not settle")
        .expect("poller reaches terminal");
    assert_eq!(view.job_status, JobStatus::Completed);
    handle.join().await;
}
