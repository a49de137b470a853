//! Progress aggregation: turns a job's result rows into display state.
//!
//! Rows are either task rows (one per selected site, tracking its scan) or
//! content rows (discovered items). Tagged rows say which they are. Rows
//! written before the tag existed are classified by their text markers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::{ScrapeJobId, ScrapeResultId, WebsiteId};
use crate::domains::scraping::models::{JobStatus, ResultStatus, RowKind, ScrapeJob, ScrapeResult};
use crate::domains::websites::models::Website;

/// Titles of legacy status rows start with one of these.
pub const STATUS_TITLE_PREFIXES: &[&str] = &["Scanned ", "Scan "];

/// Content of legacy status rows contains one of these.
pub const STATUS_CONTENT_MARKERS: &[&str] = &["Added ", "No new articles", "Scan complete"];

pub const SUCCESS_FALLBACK_TEXT: &str = "Scan Complete";
pub const FAILURE_FALLBACK_TEXT: &str = "Connection failed";
pub const IN_PROGRESS_TEXT: &str = "Scanning for new articles...";
pub const PENDING_TEXT: &str = "Waiting in queue...";
pub const UNKNOWN_WEBSITE: &str = "Unknown Website";

/// Kind of a row: its tag when present, else the legacy text heuristic.
pub fn classify(row: &ScrapeResult) -> RowKind {
    row.kind.unwrap_or_else(|| classify_untagged(row))
}

/// A legacy row is content only if it succeeded and carries no status marker.
fn classify_untagged(row: &ScrapeResult) -> RowKind {
    if row.status != ResultStatus::Success {
        return RowKind::Task;
    }

    let title = row.title.as_deref().unwrap_or_default();
    let content = row.content.as_deref().unwrap_or_default();

    let is_status_row = STATUS_TITLE_PREFIXES.iter().any(|p| title.starts_with(p))
        || STATUS_CONTENT_MARKERS.iter().any(|m| content.contains(m));

    if is_status_row {
        RowKind::Task
    } else {
        RowKind::Content
    }
}

/// Human-readable line for a task row.
pub fn display_text(row: &ScrapeResult) -> String {
    match row.status {
        ResultStatus::Success => non_empty(&row.content).unwrap_or(SUCCESS_FALLBACK_TEXT).to_string(),
        ResultStatus::Failed => non_empty(&row.error_message)
            .unwrap_or(FAILURE_FALLBACK_TEXT)
            .to_string(),
        ResultStatus::InProgress => IN_PROGRESS_TEXT.to_string(),
        ResultStatus::Pending => PENDING_TEXT.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Counts over task rows only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub success: usize,
    pub failed: usize,
    /// `success + failed`
    pub completed: usize,
    pub total: usize,
}

impl ProgressCounts {
    fn record(&mut self, status: ResultStatus) {
        match status {
            ResultStatus::Pending => self.pending += 1,
            ResultStatus::InProgress => self.in_progress += 1,
            ResultStatus::Success => self.success += 1,
            ResultStatus::Failed => self.failed += 1,
        }
        self.total += 1;
        self.completed = self.success + self.failed;
    }

    /// 0 when there are no task rows.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRowView {
    pub result_id: ScrapeResultId,
    pub website_id: WebsiteId,
    /// Present when the view was built with a website list
    pub website_name: Option<String>,
    pub status: ResultStatus,
    pub display_text: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItemView {
    pub result_id: ScrapeResultId,
    pub website_id: WebsiteId,
    pub status: ResultStatus,
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything the dashboard needs to render one job's progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub job_id: ScrapeJobId,
    pub job_status: JobStatus,
    pub is_terminal: bool,
    pub counts: ProgressCounts,
    pub progress_percent: f64,
    pub tasks: Vec<TaskRowView>,
    pub content_items: Vec<ContentItemView>,
}

/// Summarize a job's rows. Deterministic: same input, same view.
pub fn summarize(job: &ScrapeJob, results: &[ScrapeResult]) -> ProgressView {
    build_view(job, results, None)
}

/// Like [`summarize`], naming each task row's website.
pub fn summarize_with_websites(
    job: &ScrapeJob,
    results: &[ScrapeResult],
    websites: &[Website],
) -> ProgressView {
    let names: HashMap<WebsiteId, &str> = websites
        .iter()
        .map(|w| (w.id, w.name.as_str()))
        .collect();
    build_view(job, results, Some(&names))
}

fn build_view(
    job: &ScrapeJob,
    results: &[ScrapeResult],
    names: Option<&HashMap<WebsiteId, &str>>,
) -> ProgressView {
    let mut counts = ProgressCounts::default();
    let mut tasks = Vec::new();
    let mut content_items = Vec::new();

    for row in results {
        match classify(row) {
            RowKind::Task => {
                counts.record(row.status);
                tasks.push(TaskRowView {
                    result_id: row.id,
                    website_id: row.website_id,
                    website_name: names.map(|names| {
                        names
                            .get(&row.website_id)
                            .copied()
                            .unwrap_or(UNKNOWN_WEBSITE)
                            .to_string()
                    }),
                    status: row.status,
                    display_text: display_text(row),
                    title: row.title.clone(),
                    url: row.description.clone(),
                    image_url: row.image_url.clone(),
                });
            }
            RowKind::Content => content_items.push(ContentItemView {
                result_id: row.id,
                website_id: row.website_id,
                status: row.status,
                title: row.title.clone(),
                url: row.description.clone(),
                content: row.content.clone(),
                image_url: row.image_url.clone(),
                created_at: row.created_at,
            }),
        }
    }

    ProgressView {
        job_id: job.id,
        job_status: job.status,
        is_terminal: job.is_terminal(),
        counts,
        progress_percent: counts.percent(),
        tasks,
        content_items,
    }
}

/// One entry in the job history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job_id: ScrapeJobId,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Successful content rows
    pub items_found: usize,
    /// Failed content rows
    pub items_failed: usize,
    pub sites_succeeded: usize,
    pub sites_failed: usize,
    pub sites_total: usize,
}

pub fn summarize_history(job: &ScrapeJob, results: &[ScrapeResult]) -> JobSummary {
    let view = summarize(job, results);
    let items_found = view
        .content_items
        .iter()
        .filter(|c| c.status == ResultStatus::Success)
        .count();
    let items_failed = view
        .content_items
        .iter()
        .filter(|c| c.status == ResultStatus::Failed)
        .count();

    JobSummary {
        job_id: job.id,
        status: job.status,
        started_at: job.started_at,
        completed_at: job.completed_at,
        error_message: job.error_message.clone(),
        items_found,
        items_failed,
        sites_succeeded: view.counts.success,
        sites_failed: view.counts.failed,
        sites_total: view.counts.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::scraping::models::JobPatch;

    fn row(kind: Option<RowKind>, status: ResultStatus, title: Option<&str>, content: Option<&str>) -> ScrapeResult {
        let mut row = ScrapeResult::placeholder(ScrapeJobId::new(), WebsiteId::new());
        row.kind = kind;
        row.status = status;
        row.title = title.map(str::to_string);
        row.content = content.map(str::to_string);
        row
    }

    #[test]
    fn test_tag_wins_over_heuristic() {
        // Tagged task rows stay task rows whatever the title says
        let tagged = row(Some(RowKind::Task), ResultStatus::Success, Some("Breaking News"), None);
        assert_eq!(classify(&tagged), RowKind::Task);

        let tagged = row(Some(RowKind::Content), ResultStatus::Success, Some("Scanned X"), None);
        assert_eq!(classify(&tagged), RowKind::Content);
    }

    #[test]
    fn test_untagged_markers() {
        let cases = [
            (ResultStatus::Success, Some("Scan of site"), None, RowKind::Task),
            (ResultStatus::Success, Some("Headline"), Some("Added 4 articles"), RowKind::Task),
            (ResultStatus::Success, Some("Headline"), Some("No new articles today"), RowKind::Task),
            (ResultStatus::Success, Some("Headline"), Some("Scan complete"), RowKind::Task),
            (ResultStatus::Success, None, None, RowKind::Content),
            (ResultStatus::Failed, Some("Headline"), None, RowKind::Task),
            (ResultStatus::Pending, None, None, RowKind::Task),
        ];
        for (status, title, content, expected) in cases {
            assert_eq!(
                classify(&row(None, status, title, content)),
                expected,
                "status={:?} title={:?} content={:?}",
                status,
                title,
                content
            );
        }
    }

    #[test]
    fn test_display_text_fallbacks() {
        let mut success = row(Some(RowKind::Task), ResultStatus::Success, Some("T"), None);
        assert_eq!(display_text(&success), SUCCESS_FALLBACK_TEXT);
        success.content = Some("Found 3 headlines".into());
        assert_eq!(display_text(&success), "Found 3 headlines");

        let mut failed = row(Some(RowKind::Task), ResultStatus::Failed, None, None);
        assert_eq!(display_text(&failed), FAILURE_FALLBACK_TEXT);
        failed.error_message = Some("HTTP 404".into());
        assert_eq!(display_text(&failed), "HTTP 404");

        assert_eq!(
            display_text(&row(Some(RowKind::Task), ResultStatus::InProgress, None, None)),
            IN_PROGRESS_TEXT
        );
        assert_eq!(
            display_text(&row(Some(RowKind::Task), ResultStatus::Pending, None, None)),
            PENDING_TEXT
        );
    }

    #[test]
    fn test_zero_total_is_zero_percent() {
        let job = ScrapeJob::new_pending();
        let view = summarize(&job, &[]);
        assert_eq!(view.counts.total, 0);
        assert_eq!(view.progress_percent, 0.0);
    }

    #[test]
    fn test_counts_only_task_rows() {
        let mut job = ScrapeJob::new_pending();
        JobPatch::start().apply(&mut job);

        let results = vec![
            row(Some(RowKind::Task), ResultStatus::Success, Some("A"), None),
            row(Some(RowKind::Task), ResultStatus::InProgress, None, None),
            row(Some(RowKind::Task), ResultStatus::Pending, None, None),
            row(Some(RowKind::Task), ResultStatus::Failed, None, None),
            row(None, ResultStatus::Success, Some("Breaking News"), Some("story")),
        ];
        let view = summarize(&job, &results);

        assert_eq!(
            view.counts,
            ProgressCounts {
                pending: 1,
                in_progress: 1,
                success: 1,
                failed: 1,
                completed: 2,
                total: 4,
            }
        );
        assert_eq!(view.progress_percent, 50.0);
        assert_eq!(view.content_items.len(), 1);
        assert!(!view.is_terminal);
    }

    #[test]
    fn test_website_names_with_unknown_fallback() {
        let job = ScrapeJob::new_pending();
        let known = Website {
            id: WebsiteId::new(),
            name: "Flightglobal".into(),
            url: "https://flightglobal.com".into(),
            description: None,
            created_at: Utc::now(),
        };
        let mut first = row(Some(RowKind::Task), ResultStatus::Pending, None, None);
        first.website_id = known.id;
        let second = row(Some(RowKind::Task), ResultStatus::Pending, None, None);

        let view = summarize_with_websites(&job, &[first, second], &[known]);

        assert_eq!(view.tasks[0].website_name.as_deref(), Some("Flightglobal"));
        assert_eq!(view.tasks[1].website_name.as_deref(), Some(UNKNOWN_WEBSITE));
        assert!(summarize(&job, &[]).tasks.is_empty());
    }

    #[test]
    fn test_history_summary_counts() {
        let mut job = ScrapeJob::new_pending();
        JobPatch::complete().apply(&mut job);

        let results = vec![
            row(Some(RowKind::Task), ResultStatus::Success, Some("A"), None),
            row(Some(RowKind::Task), ResultStatus::Failed, None, None),
            row(Some(RowKind::Content), ResultStatus::Success, Some("Story 1"), None),
            row(Some(RowKind::Content), ResultStatus::Success, Some("Story 2"), None),
            row(Some(RowKind::Content), ResultStatus::Failed, Some("Story 3"), None),
        ];
        let summary = summarize_history(&job, &results);

        assert_eq!(summary.items_found, 2);
        assert_eq!(summary.items_failed, 1);
        assert_eq!(summary.sites_succeeded, 1);
        assert_eq!(summary.sites_failed, 1);
        assert_eq!(summary.sites_total, 2);
        assert_eq!(summary.status, JobStatus::Completed);
    }
}
