use crate::state::{BehaviorHandle, BehaviorState};
use crate::{FollowError, Head, Result, View};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Sweeps the head through evenly spaced headings, queueing one view per stop.
pub struct Scanner {
    head: Arc<Head>,
    views: mpsc::Sender<View>,
    behavior: BehaviorHandle,
    intervals: u32,
}

impl Scanner {
    pub fn new(
        head: Arc<Head>,
        views: mpsc::Sender<View>,
        behavior: BehaviorHandle,
        intervals: u32,
    ) -> Self {
        Self {
            head,
            views,
            behavior,
            intervals: intervals.max(1),
        }
    }

    /// Heading of sweep stop `index`.
    pub fn heading_at(&self, index: u32) -> f64 {
        f64::from(index) * 360.0 / f64::from(self.intervals)
    }

    /// Run one sweep per request until stopped or `requests` closes.
    pub async fn run(self, mut requests: mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = self.behavior.stopped() => break,
                req = requests.recv() => match req {
                    Some(()) => {
                        if let Err(e) = self.sweep().await {
                            warn!(%e, "sweep aborted");
                        }
                    }
                    None => break,
                },
            }
        }
        info!("scanner stopped");
    }

    /// Perform one full rotation, returning the number of views queued.
    ///
    /// Stops early when the behavior leaves the searching state. A failed aim
    /// aborts the sweep without queueing a view for that stop.
    pub async fn sweep(&self) -> Result<usize> {
        self.head.raise().await?;
        let mut queued = 0;
        for index in 0..self.intervals {
            if self.behavior.is_stopped() || self.behavior.state() != BehaviorState::Searching {
                info!(queued, "sweep interrupted");
                return Ok(queued);
            }
            let heading = self.heading_at(index);
            let view = match self.head.look_and_send("LookAround", heading).await {
                Ok(view) => view,
                Err(e) => {
                    error!(heading, %e, "look around failed");
                    return Err(e);
                }
            };
            tokio::select! {
                biased;
                _ = self.behavior.stopped() => return Ok(queued),
                sent = self.views.send(view) => {
                    if sent.is_err() {
                        return Err(FollowError::Stopped);
                    }
                }
            }
            queued += 1;
        }
        info!(queued, "look around complete");
        Ok(queued)
    }
}
