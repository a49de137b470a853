//! Scraping domain - job lifecycle, progress aggregation and polling

pub mod actions;
pub mod error;
pub mod events;
pub mod models;
pub mod poller;
pub mod progress;

pub use error::{ScrapeError, SiteScrapeError};
pub use models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, RowKind, ScrapeJob, ScrapeOutcome,
    ScrapeResult,
};
pub use poller::{
    PollTransportError, Poller, PollerHandle, PollerState, ProgressSource, StoreProgressSource,
    MIN_POLL_INTERVAL,
};
pub use progress::{summarize, summarize_history, JobSummary, ProgressCounts, ProgressView};
