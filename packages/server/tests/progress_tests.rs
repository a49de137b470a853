//! Progress aggregation over rows read back from the store.

mod common;

use std::time::Duration;

use crate::common::*;
use scrape_core::domains::scraping::actions::{job_history, load_progress, spawn_job, start_job};
use scrape_core::domains::scraping::{summarize, JobStatus, ResultStatus, SiteScrapeError};
use scrape_core::kernel::{BaseScrapeStore, MockScraper};

#[tokio::test]
async fn test_legacy_rows_are_split_into_tasks_and_content() {
    let harness = TestHarness::new(&[SITE_ONE], MockScraper::new()).await;
    let one = harness.website(SITE_ONE.0).id;
    let job = create_in_progress_job(harness.memory.as_ref()).await;

    harness
        .memory
        .insert_results(&[
            legacy_row(job.id, one, ResultStatus::Success, "Scanned Example", None),
            legacy_row(job.id, one, ResultStatus::Success, "Breaking News", Some("Story body")),
        ])
        .await
        .unwrap();

    let view = load_progress(harness.memory.as_ref(), job.id).await.unwrap();

    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].title.as_deref(), Some("Scanned Example"));
    assert_eq!(view.tasks[0].website_name.as_deref(), Some(SITE_ONE.0));

    assert_eq!(view.content_items.len(), 1);
    assert_eq!(view.content_items[0].title.as_deref(), Some("Breaking News"));

    assert_eq!(view.counts.total, 1);
    assert_eq!(view.progress_percent, 100.0);
}

#[tokio::test]
async fn test_job_without_rows_reports_zero_percent() {
    let harness = TestHarness::new(&[], MockScraper::new()).await;
    let job = create_in_progress_job(harness.memory.as_ref()).await;

    let view = load_progress(harness.memory.as_ref(), job.id).await.unwrap();
    assert_eq!(view.counts.total, 0);
    assert_eq!(view.progress_percent, 0.0);
    assert!(!view.is_terminal);
}

#[tokio::test]
async fn test_summarize_is_deterministic() {
    let harness = TestHarness::new(&[SITE_ONE, SITE_TWO], MockScraper::new()).await;
    let ids: Vec<_> = harness.websites.iter().map(|w| w.id).collect();
    let (job, _) = start_job(&ids, &harness.deps).await.unwrap();
    let rows = harness.memory.results_for_job(job.id).await.unwrap();

    assert_eq!(summarize(&job, &rows), summarize(&job, &rows));
}

#[tokio::test(start_paused = true)]
async fn test_progress_never_decreases_across_polls() {
    let scraper = MockScraper::new()
        .with_delay(SITE_ONE.1, Duration::from_millis(300))
        .with_delay(SITE_TWO.1, Duration::from_millis(700))
        .with_failure(SITE_SLOW.1, SiteScrapeError::Parse("no title".into()))
        .with_delay(SITE_SLOW.1, Duration::from_millis(500));
    let harness = TestHarness::new(&[SITE_ONE, SITE_TWO, SITE_SLOW], scraper).await;
    let ids: Vec<_> = harness.websites.iter().map(|w| w.id).collect();

    let (job, websites) = start_job(&ids, &harness.deps).await.unwrap();
    let task = spawn_job(job.id, websites, harness.deps.clone());

    let mut seen = Vec::new();
    loop {
        let view = load_progress(harness.memory.as_ref(), job.id).await.unwrap();
        seen.push(view.progress_percent);
        if view.is_terminal {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    task.await.unwrap();

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
    assert_eq!(seen.first().copied(), Some(0.0));
    assert_eq!(seen.last().copied(), Some(100.0));
}

#[tokio::test]
async fn test_history_lists_newest_first_with_counts() {
    let scraper = MockScraper::new().with_failure(
        SITE_TWO.1,
        SiteScrapeError::HttpStatus {
            url: SITE_TWO.1.to_string(),
            status: 503,
        },
    );
    let harness = TestHarness::new(&[SITE_ONE, SITE_TWO], scraper).await;
    let one = harness.website(SITE_ONE.0).id;
    let two = harness.website(SITE_TWO.0).id;

    let (first, websites) = start_job(&[one], &harness.deps).await.unwrap();
    spawn_job(first.id, websites, harness.deps.clone()).await.unwrap();

    let (second, websites) = start_job(&[one, two], &harness.deps).await.unwrap();
    spawn_job(second.id, websites, harness.deps.clone()).await.unwrap();

    let history = job_history(harness.memory.as_ref(), 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].job_id, second.id);
    assert_eq!(history[0].status, JobStatus::Completed);
    assert_eq!(history[0].sites_total, 2);
    assert_eq!(history[0].sites_succeeded, 1);
    assert_eq!(history[0].sites_failed, 1);
    assert_eq!(history[1].job_id, first.id);

    let limited = job_history(harness.memory.as_ref(), 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}
