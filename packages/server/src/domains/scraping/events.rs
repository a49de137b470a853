//! Push side of progress reporting: a fresh view on the stream hub after each change.

use tracing::warn;

use crate::common::ScrapeJobId;
use crate::domains::scraping::actions::load_progress;
use crate::kernel::ServerDeps;

/// Stream hub topic carrying a job's `ProgressView`s.
pub fn progress_topic(job_id: ScrapeJobId) -> String {
    format!("scrape_job:{}", job_id)
}

/// Publish the job's current progress. Skipped when nobody is subscribed.
///
/// Failures are logged; publishing never affects the job itself.
pub async fn publish_progress(deps: &ServerDeps, job_id: ScrapeJobId) {
    let topic = progress_topic(job_id);
    if !deps.stream_hub.has_subscribers(&topic).await {
        return;
    }

    let view = match load_progress(deps.store.as_ref(), job_id).await {
        Ok(view) => view,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Could not build progress update");
            return;
        }
    };

    match serde_json::to_value(&view) {
        Ok(value) => {
            deps.stream_hub.publish(&topic, value).await;
        }
        Err(e) => warn!(job_id = %job_id, error = %e, "Could not serialize progress update"),
    }
}
