pub mod scrape_job;
pub mod scrape_result;

pub use scrape_job::{JobPatch, JobStatus, ScrapeJob};
pub use scrape_result::{ResultPatch, ResultStatus, RowKind, ScrapeOutcome, ScrapeResult};
