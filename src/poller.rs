//! Presence poller state machine
//!
//! Polls a `PresenceSource` on a fixed cadence and publishes the latest
//! `PollerState` through a watch channel. Debounce, request timeout,
//! rate-limit backoff and the single-shot failure retry all live in one
//! `tokio::select!` loop, so stopping the task cancels every pending timer
//! and the in-flight request in one go.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Sleep};

use crate::api::client::{fetch_with_timeout, FetchError, PresenceSource};
use crate::models::PresenceSnapshot;

/// Cadence of automatic polls while not rate-limited.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Trailing debounce window; bursts of fetch requests inside it collapse
/// into a single network request.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Delay before the single retry scheduled after a generic failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// Observable poller state. Exactly one variant at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum PollerState {
    /// No fetch has completed yet (or a manual retry reset the view).
    Loading,
    /// Latest successfully fetched snapshot.
    Ready(PresenceSnapshot),
    /// Server asked us to back off; automatic polling is suspended for
    /// `retry_after` seconds.
    RateLimited { retry_after: u64 },
    /// Last fetch failed; a retry is scheduled unless rate-limited.
    Failed(String),
}

enum Command {
    /// Debounced fetch request (interval tick, retry timer, external nudge).
    Fetch,
    /// User-initiated retry: reset to Loading, then fetch even while
    /// rate-limited.
    Retry,
    Stop,
}

type FetchFuture = Pin<Box<dyn Future<Output = Result<PresenceSnapshot, FetchError>> + Send>>;

/// Handle to a running poller task.
///
/// Dropping the handle stops the task the same way `stop()` does.
pub struct Poller {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<PollerState>,
}

impl Poller {
    /// Spawn the polling task. The first fetch goes out after one debounce
    /// window; subsequent polls follow `POLL_INTERVAL`.
    pub fn start(source: Arc<dyn PresenceSource>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PollerState::Loading);
        tokio::spawn(poll_loop(source, state_tx, cmd_rx));
        Self { cmd_tx, state_rx }
    }

    /// Watch channel carrying the latest state.
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state_rx.clone()
    }

    /// Request a fetch. Coalesced with other requests inside the debounce
    /// window.
    pub fn request_fetch(&self) {
        let _ = self.cmd_tx.send(Command::Fetch);
    }

    /// User-initiated retry: publishes Loading and re-enters the fetch path.
    pub fn retry(&self) {
        let _ = self.cmd_tx.send(Command::Retry);
    }

    /// Stop the poller. Idempotent. Cancels the in-flight request, the
    /// pending debounced fetch and every timer; no state is published
    /// afterwards.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }
}

async fn poll_loop(
    source: Arc<dyn PresenceSource>,
    state_tx: watch::Sender<PollerState>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut interval = time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    // One-shot deadlines; None = not armed. `rate_limit` doubles as the
    // gate that suspends automatic polling.
    let mut debounce: Option<Pin<Box<Sleep>>> = None;
    let mut retry: Option<Pin<Box<Sleep>>> = None;
    let mut rate_limit: Option<Pin<Box<Sleep>>> = None;

    // At most one request in flight; a debounce expiry while one is
    // outstanding is dropped, not queued.
    let mut in_flight: Option<FetchFuture> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Fetch) => {
                    debounce = Some(Box::pin(time::sleep(DEBOUNCE_WINDOW)));
                }
                Some(Command::Retry) => {
                    state_tx.send_replace(PollerState::Loading);
                    debounce = Some(Box::pin(time::sleep(DEBOUNCE_WINDOW)));
                }
                Some(Command::Stop) | None => break,
            },

            _ = interval.tick() => {
                // The interval keeps ticking while rate-limited; its ticks
                // are dropped until the server-specified backoff elapses.
                if rate_limit.is_none() {
                    debounce = Some(Box::pin(time::sleep(DEBOUNCE_WINDOW)));
                }
            }

            _ = async { debounce.as_mut().expect("guarded by is_some").await },
                if debounce.is_some() =>
            {
                debounce = None;
                if in_flight.is_none() {
                    let source = Arc::clone(&source);
                    in_flight = Some(Box::pin(async move {
                        fetch_with_timeout(source.as_ref()).await
                    }));
                } else {
                    tracing::debug!("fetch already in flight, dropping debounced request");
                }
            }

            result = async { in_flight.as_mut().expect("guarded by is_some").await },
                if in_flight.is_some() =>
            {
                in_flight = None;
                match result {
                    Ok(snapshot) => {
                        rate_limit = None;
                        retry = None;
                        state_tx.send_replace(PollerState::Ready(snapshot));
                    }
                    Err(FetchError::RateLimited { retry_after }) => {
                        tracing::warn!("rate limited, backing off {}s", retry_after);
                        retry = None;
                        rate_limit =
                            Some(Box::pin(time::sleep(Duration::from_secs(retry_after))));
                        state_tx.send_replace(PollerState::RateLimited { retry_after });
                    }
                    Err(e) => {
                        tracing::warn!("presence fetch failed: {}", e);
                        state_tx.send_replace(PollerState::Failed(e.to_string()));
                        // Exactly one pending retry; re-arming replaces any
                        // earlier one. Suppressed while rate-limited.
                        if rate_limit.is_none() {
                            retry = Some(Box::pin(time::sleep(RETRY_DELAY)));
                        }
                    }
                }
            }

            _ = async { retry.as_mut().expect("guarded by is_some").await },
                if retry.is_some() =>
            {
                retry = None;
                debounce = Some(Box::pin(time::sleep(DEBOUNCE_WINDOW)));
            }

            _ = async { rate_limit.as_mut().expect("guarded by is_some").await },
                if rate_limit.is_some() =>
            {
                rate_limit = None;
                debounce = Some(Box::pin(time::sleep(DEBOUNCE_WINDOW)));
            }
        }
    }
}
