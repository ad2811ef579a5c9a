//! Status polling after a server start.
//!
//! One task per start. It fetches the server status every `interval` and
//! publishes each reading on a single-slot channel until the server reaches
//! a terminal state, the deadline passes, or a fetch fails. Channel closure
//! is the only completion signal.

use crate::hosting::{HostingApi, ServerStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Timing of a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    timeout: Duration,
    interval: Duration,
}

impl PollOptions {
    pub const MIN_INTERVAL: Duration = Duration::from_secs(5);
    pub const MIN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Clamp to the minimums and keep `interval <= timeout`.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        let interval = interval.max(Self::MIN_INTERVAL);
        let timeout = timeout.max(Self::MIN_TIMEOUT);
        Self {
            timeout,
            interval: interval.min(timeout),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(50), Duration::from_secs(10))
    }
}

/// Receiving end of a status poll.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::Receiver<ServerStatus>,
}

impl StatusStream {
    /// Next reading, or `None` once polling has finished.
    pub async fn recv(&mut self) -> Option<ServerStatus> {
        self.rx.recv().await
    }

    /// Drain the stream and return the final reading.
    pub async fn last(mut self) -> Option<ServerStatus> {
        let mut last = None;
        while let Some(status) = self.rx.recv().await {
            last = Some(status);
        }
        last
    }
}

/// Spawns status poll tasks.
pub struct StatusPoller {
    api: Arc<dyn HostingApi>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn HostingApi>) -> Self {
        Self { api }
    }

    /// Poll `server_id` in the background.
    ///
    /// Until the first reading the status is assumed to be `starting`; a
    /// timeout publishes the latest known status before closing.
    pub fn spawn(&self, api_key: String, server_id: String, opts: PollOptions) -> StatusStream {
        let (tx, rx) = mpsc::channel(1);
        let api = Arc::clone(&self.api);

        tokio::spawn(async move {
            let outcome = poll(api.as_ref(), &api_key, &server_id, opts, &tx).await;
            debug!(server = %server_id, outcome, "Status poll finished");
            crate::metrics::record_status_poll(outcome);
        });

        StatusStream { rx }
    }
}

async fn poll(
    api: &dyn HostingApi,
    api_key: &str,
    server_id: &str,
    opts: PollOptions,
    tx: &mpsc::Sender<ServerStatus>,
) -> &'static str {
    let start = Instant::now();
    let deadline = start + opts.timeout();
    let mut ticker = tokio::time::interval_at(start + opts.interval(), opts.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = ServerStatus::Starting;

    loop {
        tokio::select! {
            biased;

            // A tick landing on the deadline still gets its fetch.
            _ = ticker.tick() => {
                let final_tick = Instant::now() >= deadline;
                let fetched = if final_tick {
                    Ok(api.server_info(api_key, server_id).await)
                } else {
                    tokio::time::timeout_at(deadline, api.server_info(api_key, server_id)).await
                };
                match fetched {
                    Err(_) => {
                        let _ = tx.send(last).await;
                        return "timeout";
                    }
                    Ok(Err(e)) => {
                        warn!(server = %server_id, error = %e, "Status poll failed");
                        return "error";
                    }
                    Ok(Ok(info)) => {
                        last = info.status;
                        if tx.send(last).await.is_err() {
                            return "abandoned";
                        }
                        if last.is_start_terminal() {
                            return "terminal";
                        }
                        if final_tick {
                            return "timeout";
                        }
                    }
                }
            }

            _ = tokio::time::sleep_until(deadline) => {
                let _ = tx.send(last).await;
                return "timeout";
            }
        }
    }
}
