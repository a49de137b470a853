mod create_job;
mod dispatch;
mod execute_job;
mod queries;
mod recover;

pub use create_job::{create_job, start_job};
pub use dispatch::dispatch_job;
pub use execute_job::{fail_job, finalize_job, run_job, scrape_site, spawn_job, SiteRun};
pub use queries::{get_job, get_results, job_history, load_progress, DEFAULT_HISTORY_LIMIT};
pub use recover::{
    claim_lease, recover_orphaned_jobs, RecoveryReport, CLAIM_GRACE, INTERRUPTED_MESSAGE,
    MISSING_WEBSITE_MESSAGE,
};
