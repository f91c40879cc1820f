use crate::found::FoundReceiver;
use crate::state::{BehaviorHandle, BehaviorState, Transition};
use crate::traits::FaceDetector;
use crate::{Head, View};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of checking a found view again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confirmation {
    /// The face is still at the claimed heading.
    Direct(f64),
    /// The face was reacquired one sweep step away.
    Peripheral(f64),
    /// Neither the heading nor its neighbours show a face.
    Lost,
}

impl Confirmation {
    pub fn heading(&self) -> Option<f64> {
        match self {
            Confirmation::Direct(h) | Confirmation::Peripheral(h) => Some(*h),
            Confirmation::Lost => None,
        }
    }
}

/// Re-aims at each found view and verifies the face before committing it as
/// the target.
///
/// A miss is followed by one probe a sweep step to each side. When all three
/// checks fail the scanner is re-armed.
pub struct Confirmer {
    head: Arc<Head>,
    detector: Arc<dyn FaceDetector>,
    behavior: BehaviorHandle,
    step: f64,
}

impl Confirmer {
    pub fn new(
        head: Arc<Head>,
        detector: Arc<dyn FaceDetector>,
        behavior: BehaviorHandle,
        step: f64,
    ) -> Self {
        Self {
            head,
            detector,
            behavior,
            step,
        }
    }

    pub async fn run(mut self, mut found: FoundReceiver) {
        let stop = self.behavior.clone();
        loop {
            let view = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                view = found.recv() => match view {
                    Some(view) => view,
                    None => break,
                },
            };
            if self.behavior.state() != BehaviorState::Searching {
                debug!(view = view.id(), "not searching, skipping found view");
                continue;
            }
            info!(view = view.id(), "looking at view");
            let outcome = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                outcome = self.confirm(&view) => outcome,
            };
            match outcome.heading() {
                Some(heading) => {
                    info!(heading, ?outcome, "face confirmed");
                    if self.behavior.commit(heading).await.is_err() {
                        break;
                    }
                }
                None => {
                    info!(view = view.id(), "could not relocate face");
                    self.behavior.request(Transition::Rearm);
                }
            }
        }
        info!("confirmer stopped");
    }

    /// Look at `view`'s heading again, then at its two neighbours.
    pub async fn confirm(&self, view: &View) -> Confirmation {
        if let Some(heading) = self.check("ConfirmFaceFound", view.heading(), true).await {
            return Confirmation::Direct(heading);
        }
        info!("adjusting direction");
        for offset in [self.step, -self.step] {
            if let Some(heading) = self.check("Look", view.heading() + offset, false).await {
                return Confirmation::Peripheral(heading);
            }
        }
        Confirmation::Lost
    }

    async fn check(&self, source: &str, heading: f64, send: bool) -> Option<f64> {
        let view = if send {
            self.head.look_and_send(source, heading).await
        } else {
            self.head.look(source, heading).await
        };
        let view = match view {
            Ok(view) => view,
            Err(e) => {
                warn!(heading, %e, "confirmation look failed");
                return None;
            }
        };
        match self.detector.detect(view.image()).await {
            Ok(faces) if !faces.is_empty() => Some(view.heading()),
            Ok(_) => None,
            Err(e) => {
                error!(view = view.id(), %e, "face detection failed");
                None
            }
        }
    }
}
