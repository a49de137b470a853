//! Typed ID definitions for all domain entities.
//!
//! ```rust,ignore
//! use scrape_core::common::{ScrapeJobId, WebsiteId};
//!
//! let job_id = ScrapeJobId::new();
//! let website_id = WebsiteId::new();
//!
//! // Compile error - different entity types:
//! // let wrong: WebsiteId = job_id;
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Website entities (scrape targets).
pub struct Website;

/// Marker type for ScrapeJob entities (one batch run).
pub struct ScrapeJob;

/// Marker type for ScrapeResult entities (task and content rows).
pub struct ScrapeResult;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type WebsiteId = Id<Website>;

pub type ScrapeJobId = Id<ScrapeJob>;

pub type ScrapeResultId = Id<ScrapeResult>;
