//! Client-side poller: watch a job on a fixed interval until it is terminal.
//!
//! ```text
//! Idle --start--> Polling --terminal view--> Terminal
//!                    |
//!                 cancel / drop
//!                    v
//!                  Idle
//! ```
//!
//! The transition function ([`PollerState::on_fetch`]) is pure; the async
//! driver only owns the timer and the fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::ScrapeJobId;
use crate::domains::scraping::actions::load_progress;
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::progress::ProgressView;
use crate::kernel::BaseScrapeStore;

/// One poll fetch failed. Logged and retried on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollTransportError {
    #[error("scrape job {0} not found")]
    JobMissing(ScrapeJobId),

    #[error("poll fetch failed: {0}")]
    Fetch(String),
}

impl From<ScrapeError> for PollTransportError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::NotFound(job_id) => PollTransportError::JobMissing(job_id),
            other => PollTransportError::Fetch(other.to_string()),
        }
    }
}

/// Where the poller reads a job's progress from.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch(&self, job_id: ScrapeJobId) -> Result<ProgressView, PollTransportError>;
}

/// Reads job + result rows straight from the record store.
pub struct StoreProgressSource {
    store: Arc<dyn BaseScrapeStore>,
}

impl StoreProgressSource {
    pub fn new(store: Arc<dyn BaseScrapeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProgressSource for StoreProgressSource {
    async fn fetch(&self, job_id: ScrapeJobId) -> Result<ProgressView, PollTransportError> {
        Ok(load_progress(self.store.as_ref(), job_id).await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollerState {
    Idle,
    Polling { latest: Option<ProgressView> },
    Terminal { view: ProgressView },
}

impl PollerState {
    /// Next state after a fetch. Failed fetches keep the current state.
    pub fn on_fetch(self, fetched: Result<ProgressView, PollTransportError>) -> PollerState {
        match self {
            PollerState::Polling { latest } => match fetched {
                Ok(view) if view.is_terminal => PollerState::Terminal { view },
                Ok(view) => PollerState::Polling { latest: Some(view) },
                Err(_) => PollerState::Polling { latest },
            },
            settled => settled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerState::Terminal { .. })
    }

    /// Most recent successfully fetched view
    pub fn latest(&self) -> Option<&ProgressView> {
        match self {
            PollerState::Idle => None,
            PollerState::Polling { latest } => latest.as_ref(),
            PollerState::Terminal { view } => Some(view),
        }
    }
}

/// Shortest period between fetches; a zero interval is raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct Poller {
    source: Arc<dyn ProgressSource>,
    interval: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn ProgressSource>, interval: Duration) -> Self {
        Self {
            source,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Enter `Polling` for `job_id`; the first fetch happens immediately.
    pub fn start(&self, job_id: ScrapeJobId) -> PollerHandle {
        let (tx, rx) = watch::channel(PollerState::Polling { latest: None });
        let tx = Arc::new(tx);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(poll_loop(
            self.source.clone(),
            job_id,
            self.interval,
            tx.clone(),
            cancel.clone(),
        ));

        PollerHandle {
            tx,
            rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn poll_loop(
    source: Arc<dyn ProgressSource>,
    job_id: ScrapeJobId,
    period: Duration,
    tx: Arc<watch::Sender<PollerState>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    // A slow fetch delays the next tick instead of causing a burst
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = source.fetch(job_id) => fetched,
        };

        if let Err(e) = &fetched {
            warn!(job_id = %job_id, error = %e, "Poll fetch failed, retrying on next tick");
        }

        let next = tx.borrow().clone().on_fetch(fetched);
        let done = !matches!(next, PollerState::Polling { .. });
        tx.send_replace(next);
        if done {
            debug!(job_id = %job_id, "Polling stopped");
            return;
        }
    }

    tx.send_replace(PollerState::Idle);
    debug!(job_id = %job_id, "Polling cancelled");
}

/// Owner of a running poll loop. Dropping it cancels the loop.
pub struct PollerHandle {
    tx: Arc<watch::Sender<PollerState>>,
    rx: watch::Receiver<PollerState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn state(&self) -> PollerState {
        self.rx.borrow().clone()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.rx.clone()
    }

    /// Wait until polling stops. Returns the terminal view, or `None` if cancelled.
    pub async fn wait_terminal(&self) -> Option<ProgressView> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|s| !matches!(s, PollerState::Polling { .. }))
            .await
            .ok()?;
        match &*state {
            PollerState::Terminal { view } => Some(view.clone()),
            _ => None,
        }
    }

    /// Discard the job: stop fetching and return to `Idle`.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.tx.send_replace(PollerState::Idle);
    }

    /// Wait for the poll task to exit.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
