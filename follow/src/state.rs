//! Behavior state shared by the pipeline stages.
//!
//! The state is owned by a [`StateKeeper`] task. Stages never write it
//! directly; they send [`Transition`]s and observe the result through a
//! [`watch`] channel.

use crate::{FollowError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// What the robot is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorState {
    Idle,
    Searching,
    Tracking,
}

/// Snapshot of the behavior: state plus the committed target heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Status {
    pub state: BehaviorState,
    pub target: Option<f64>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: BehaviorState::Idle,
            target: None,
        }
    }
}

/// Requested change to the behavior state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Start a new search. Clears the previous target.
    BeginSeeking,
    /// A face was confirmed at this heading.
    Commit(f64),
    /// Confirmation failed; sweep again.
    Rearm,
    /// Return to idle from any state.
    Stop,
}

impl Status {
    /// Apply `transition`, returning the next status or `None` when the
    /// transition is not valid from the current state.
    pub fn apply(self, transition: Transition) -> Option<Status> {
        use BehaviorState::*;
        match (self.state, transition) {
            (Idle, Transition::BeginSeeking) => Some(Status {
                state: Searching,
                target: None,
            }),
            (Searching, Transition::Commit(heading)) => Some(Status {
                state: Tracking,
                target: Some(heading),
            }),
            (Searching, Transition::Rearm) => Some(self),
            (_, Transition::Stop) => Some(Status {
                state: Idle,
                ..self
            }),
            _ => None,
        }
    }
}

/// Task that serializes all state transitions.
///
/// Accepted `BeginSeeking` and `Rearm` transitions also request a sweep from
/// the scanner. Requests coalesce: a sweep already pending is not queued
/// twice.
pub struct StateKeeper {
    status: Arc<watch::Sender<Status>>,
    transitions: mpsc::UnboundedReceiver<Transition>,
    sweeps: mpsc::Sender<()>,
}

impl StateKeeper {
    /// Create a keeper publishing on `status` and requesting sweeps on `sweeps`.
    ///
    /// Returns the keeper and the sender stages use to request transitions.
    pub fn new(
        status: Arc<watch::Sender<Status>>,
        sweeps: mpsc::Sender<()>,
    ) -> (Self, mpsc::UnboundedSender<Transition>) {
        let (tx, transitions) = mpsc::unbounded_channel();
        (
            Self {
                status,
                transitions,
                sweeps,
            },
            tx,
        )
    }

    /// Apply transitions until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(transition) = self.transitions.recv().await {
            let current = *self.status.borrow();
            match current.apply(transition) {
                Some(next) => {
                    if next != current {
                        info!(from = ?current.state, to = ?next.state, heading = ?next.target, "behavior transition");
                    }
                    self.status.send_replace(next);
                    if matches!(transition, Transition::BeginSeeking | Transition::Rearm) {
                        let _ = self.sweeps.try_send(());
                    }
                }
                None => debug!(state = ?current.state, ?transition, "transition ignored"),
            }
        }
    }
}

/// Broadcast stop signal for one behavior session.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Signal every subscriber to stop.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// What each pipeline stage holds: a view of the status, a way to request
/// transitions and the session's stop signal.
#[derive(Clone)]
pub struct BehaviorHandle {
    status: watch::Receiver<Status>,
    transitions: mpsc::UnboundedSender<Transition>,
    shutdown: watch::Receiver<bool>,
}

impl BehaviorHandle {
    pub fn new(
        status: watch::Receiver<Status>,
        transitions: mpsc::UnboundedSender<Transition>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            status,
            transitions,
            shutdown,
        }
    }

    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    pub fn state(&self) -> BehaviorState {
        self.status.borrow().state
    }

    pub fn target(&self) -> Option<f64> {
        self.status.borrow().target
    }

    /// Request a transition without waiting for it to apply.
    pub fn request(&self, transition: Transition) {
        let _ = self.transitions.send(transition);
    }

    /// Commit `heading` as the target and wait until the keeper has left
    /// the searching state.
    pub async fn commit(&mut self, heading: f64) -> Result<Status> {
        self.transitions
            .send(Transition::Commit(heading))
            .map_err(|_| FollowError::Stopped)?;
        self.settled(|s| s.state != BehaviorState::Searching).await
    }

    /// Wait until the state equals `state`.
    pub async fn wait_for_state(&mut self, state: BehaviorState) -> Result<Status> {
        self.settled(|s| s.state == state).await
    }

    async fn settled(&mut self, mut done: impl FnMut(&Status) -> bool) -> Result<Status> {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            res = self.status.wait_for(|s| done(s)) => {
                res.map(|s| *s).map_err(|_| FollowError::Stopped)
            }
            _ = shutdown.wait_for(|stop| *stop) => Err(FollowError::Stopped),
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolve once the session is told to stop.
    pub async fn stopped(&self) {
        let mut shutdown = self.shutdown.clone();
        let _ = shutdown.wait_for(|stop| *stop).await;
    }
}
