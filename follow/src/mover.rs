use crate::state::{BehaviorHandle, BehaviorState};
use crate::traits::RangeFinder;
use crate::{Head, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one pursuit cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pulse {
    /// Walked toward the heading.
    Walked(f64),
    /// Held position because the target is too close or the range is unknown.
    Held,
    /// No walk happened: no target or the walk primitive failed.
    Skipped,
}

/// Direct pursuit of the committed target heading while tracking.
pub struct Mover {
    head: Arc<Head>,
    range: Arc<dyn RangeFinder>,
    behavior: BehaviorHandle,
    pulse: Duration,
    min_safe_distance: Option<f64>,
}

impl Mover {
    pub fn new(
        head: Arc<Head>,
        range: Arc<dyn RangeFinder>,
        behavior: BehaviorHandle,
        pulse: Duration,
        min_safe_distance: Option<f64>,
    ) -> Self {
        Self {
            head,
            range,
            behavior,
            pulse,
            min_safe_distance,
        }
    }

    pub async fn run(mut self) {
        let stop = self.behavior.clone();
        'session: loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                res = self.behavior.wait_for_state(BehaviorState::Tracking) => {
                    if res.is_err() {
                        break;
                    }
                }
            }
            info!(heading = ?self.behavior.target(), "moving to target");
            while self.behavior.state() == BehaviorState::Tracking {
                tokio::select! {
                    biased;
                    _ = stop.stopped() => break 'session,
                    _ = self.step() => {}
                }
            }
        }
        self.head.halt().await;
        info!("mover stopped");
    }

    /// Read the distance, then aim and walk one pulse toward the target.
    pub async fn step(&self) -> Pulse {
        let distance = match self.distance().await {
            Ok(d) => {
                debug!(distance = d, "distance reading");
                Some(d)
            }
            Err(e) => {
                warn!(%e, "distance sensor unavailable");
                None
            }
        };
        let Some(heading) = self.behavior.target() else {
            tokio::time::sleep(self.pulse).await;
            return Pulse::Skipped;
        };
        if let Some(min) = self.min_safe_distance {
            if distance.is_none_or(|d| d < min) {
                info!(?distance, min, "holding position");
                tokio::time::sleep(self.pulse).await;
                return Pulse::Held;
            }
        }
        match self.head.pursue(heading, self.pulse).await {
            Ok(()) => Pulse::Walked(heading),
            Err(e) => {
                warn!(heading, %e, "walk pulse failed");
                tokio::time::sleep(self.pulse).await;
                Pulse::Skipped
            }
        }
    }

    async fn distance(&self) -> Result<f64> {
        let mut reading = self.range.open().await?;
        reading.read().await
    }
}
