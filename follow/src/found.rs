//! Rendezvous channel between the face detector and the confirmer.
//!
//! A send completes only once the confirmer has taken the view, so at most
//! one found view is ever in flight and a busy confirmer holds the detector
//! back.

use crate::{FollowError, Result, View};
use tokio::sync::{mpsc, oneshot};

type Handoff = (View, oneshot::Sender<()>);

/// Create a connected sender/receiver pair.
pub fn found_queue() -> (FoundSender, FoundReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (FoundSender { tx }, FoundReceiver { rx })
}

#[derive(Clone)]
pub struct FoundSender {
    tx: mpsc::Sender<Handoff>,
}

impl FoundSender {
    /// Hand `view` over, waiting until the receiver takes it.
    pub async fn send(&self, view: View) -> Result<()> {
        let (ack, taken) = oneshot::channel();
        self.tx
            .send((view, ack))
            .await
            .map_err(|_| FollowError::Stopped)?;
        taken.await.map_err(|_| FollowError::Stopped)
    }
}

pub struct FoundReceiver {
    rx: mpsc::Receiver<Handoff>,
}

impl FoundReceiver {
    /// Take the next view, releasing its sender.
    pub async fn recv(&mut self) -> Option<View> {
        let (view, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(view)
    }
}
