use crate::found::FoundSender;
use crate::state::BehaviorHandle;
use crate::traits::{FaceDetector, Telemetry};
use crate::{TaskGroup, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Drains the view queue, running one detection task per fresh view.
///
/// Views with a face are sent to telemetry and handed to the confirmer.
/// Detections complete in any order.
pub struct FaceFinder {
    detector: Arc<dyn FaceDetector>,
    telemetry: Arc<dyn Telemetry>,
    found: FoundSender,
    behavior: BehaviorHandle,
    expiration: Duration,
    await_on_stop: bool,
}

impl FaceFinder {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        telemetry: Arc<dyn Telemetry>,
        found: FoundSender,
        behavior: BehaviorHandle,
        expiration: Duration,
    ) -> Self {
        Self {
            detector,
            telemetry,
            found,
            behavior,
            expiration,
            await_on_stop: false,
        }
    }

    /// Wait for in-flight detections on stop instead of aborting them.
    pub fn await_on_stop(mut self, wait: bool) -> Self {
        self.await_on_stop = wait;
        self
    }

    pub async fn run(self, mut views: mpsc::Receiver<View>) {
        let mut detections = TaskGroup::new();
        loop {
            tokio::select! {
                biased;
                _ = self.behavior.stopped() => {
                    info!("stop called during find faces");
                    break;
                }
                view = views.recv() => match view {
                    Some(view) => self.dispatch(view, &mut detections),
                    None => break,
                },
            }
            detections.reap();
        }
        let pending = detections.len();
        if self.await_on_stop {
            debug!(pending, "awaiting detections");
            detections.join().await;
        } else {
            debug!(pending, "abandoning detections");
            detections.shutdown().await;
        }
    }

    fn dispatch(&self, view: View, detections: &mut TaskGroup) {
        if view.is_expired(self.expiration) {
            debug!(view = view.id(), age_ms = view.age().as_millis() as u64, "view expired");
            return;
        }
        let detector = self.detector.clone();
        let telemetry = self.telemetry.clone();
        let found = self.found.clone();
        let behavior = self.behavior.clone();
        detections.spawn(async move {
            match detector.detect(view.image()).await {
                Ok(faces) if !faces.is_empty() => {
                    info!(view = view.id(), heading = view.heading(), faces = faces.len(), "face found");
                    telemetry.send_image(view.image());
                    // a stopped confirmer may never take the view
                    tokio::select! {
                        biased;
                        _ = behavior.stopped() => debug!("stopped, dropping found view"),
                        sent = found.send(view) => {
                            if sent.is_err() {
                                debug!("confirmer gone, dropping found view");
                            }
                        }
                    }
                }
                Ok(_) => debug!(view = view.id(), "no faces found"),
                Err(e) => error!(view = view.id(), %e, "face detection failed"),
            }
        });
    }
}
