//! Background feed polling.
//!
//! The scheduler has a single armed state: wait the fixed delay, refresh every
//! known feed, re-arm. The delay counts from the end of a cycle, so a slow
//! proxy never causes overlapping cycles. Parsed posts are forwarded to the
//! state owner as [`AppEvent::PostsFetched`]; dedup against the known links
//! happens there, in one mutation per feed.
//!
//! Unlike a bare repeating timer, the loop is owned by a [`PollHandle`] and
//! stops when the handle is stopped or dropped, or when the event receiver
//! goes away.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::{load_feed, ProxyClient};
use crate::app::AppEvent;
use crate::state::Feed;

const DEFAULT_CONCURRENCY: usize = 10;

/// Outcome counts of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Feeds fetched and parsed successfully.
    pub refreshed: usize,
    /// Feeds skipped because fetching or parsing failed.
    pub failed: usize,
}

pub struct PollScheduler {
    client: ProxyClient,
    interval: Duration,
    concurrency: usize,
}

impl PollScheduler {
    pub fn new(client: ProxyClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of feeds fetched at the same time.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Starts the polling loop on the current tokio runtime.
    ///
    /// `feeds` is read at the start of every cycle, so feeds added while the
    /// loop is waiting are picked up by the next cycle.
    pub fn spawn(
        self,
        feeds: watch::Receiver<Arc<Vec<Feed>>>,
        events: mpsc::Sender<AppEvent>,
    ) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(feeds, events, shutdown_rx));
        PollHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(
        self,
        feeds: watch::Receiver<Arc<Vec<Feed>>>,
        events: mpsc::Sender<AppEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "Poll scheduler armed");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = events.closed() => {
                    tracing::debug!("Event receiver dropped, stopping poll scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            let snapshot = Arc::clone(&*feeds.borrow());
            if snapshot.is_empty() {
                continue;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                report = poll_once(&self.client, &snapshot, self.concurrency, &events) => {
                    tracing::debug!(
                        refreshed = report.refreshed,
                        failed = report.failed,
                        "Poll cycle complete"
                    );
                }
            }
        }

        tracing::debug!("Poll scheduler stopped");
    }
}

/// Cancellation handle for a running [`PollScheduler`].
///
/// Dropping the handle aborts the loop; [`PollHandle::stop`] shuts it down
/// and waits for the task to finish.
pub struct PollHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Poll scheduler task failed");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Refreshes every feed once.
///
/// Feeds are fetched concurrently (at most `concurrency` in flight) and each
/// success is reported as soon as it completes, so results may arrive out of
/// order. A failing feed is logged and skipped; it never aborts the cycle.
pub async fn poll_once(
    client: &ProxyClient,
    feeds: &[Feed],
    concurrency: usize,
    events: &mpsc::Sender<AppEvent>,
) -> CycleReport {
    let outcomes: Vec<bool> = stream::iter(feeds.iter().cloned())
        .map(|feed| refresh_one(client, feed, events))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let refreshed = outcomes.iter().filter(|ok| **ok).count();
    CycleReport {
        refreshed,
        failed: outcomes.len() - refreshed,
    }
}

/// Fetches one feed and forwards its posts. Returns whether it succeeded.
async fn refresh_one(client: &ProxyClient, feed: Feed, events: &mpsc::Sender<AppEvent>) -> bool {
    match load_feed(client, &feed.url).await {
        Ok(parsed) => {
            let event = AppEvent::PostsFetched {
                feed_id: feed.id,
                posts: parsed.posts,
            };
            if events.send(event).await.is_err() {
                tracing::debug!(feed = %feed.url, "Event receiver dropped, discarding posts");
            }
            true
        }
        Err(e) => {
            tracing::warn!(
                feed = %feed.url,
                kind = %e.kind(),
                error = %e,
                "Feed refresh failed, skipping"
            );
            false
        }
    }
}
