use crate::confirmer::Confirmer;
use crate::finder::FaceFinder;
use crate::found::found_queue;
use crate::mover::Mover;
use crate::scanner::Scanner;
use crate::sight::Sight;
use crate::skill::{Command, Skill};
use crate::state::{BehaviorHandle, BehaviorState, Shutdown, StateKeeper, Status, Transition};
use crate::traits::{Body, Camera, FaceDetector, RangeFinder, Telemetry};
use crate::{FollowConfig, FollowError, Head, Result, TaskGroup};
use async_trait::async_trait;
use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything the host provides to the behavior.
#[derive(Clone)]
pub struct Collaborators {
    pub body: Arc<dyn Body>,
    pub camera: Arc<dyn Camera>,
    pub detector: Arc<dyn FaceDetector>,
    pub telemetry: Arc<dyn Telemetry>,
    pub range: Arc<dyn RangeFinder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Seeking,
    Sight,
}

struct Session {
    mode: Mode,
    shutdown: Shutdown,
    transitions: Option<mpsc::UnboundedSender<Transition>>,
    tasks: TaskGroup,
    keeper: Option<JoinHandle<()>>,
}

/// Composition root of the follow behavior.
///
/// Owns the behavior status and runs at most one session at a time: either
/// the seeking pipeline (scanner, face finder, confirmer and mover) or the
/// live sight loop.
pub struct FollowController {
    config: FollowConfig,
    parts: Collaborators,
    head: Arc<Head>,
    status: Arc<watch::Sender<Status>>,
    ready: AtomicBool,
    session: Mutex<Option<Session>>,
}

impl FollowController {
    pub fn new(config: FollowConfig, parts: Collaborators) -> Self {
        let head = Arc::new(Head::new(
            parts.body.clone(),
            parts.camera.clone(),
            parts.telemetry.clone(),
            &config,
        ));
        let (status, _) = watch::channel(Status::default());
        Self {
            config,
            parts,
            head,
            status: Arc::new(status),
            ready: AtomicBool::new(false),
            session: Mutex::new(None),
        }
    }

    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// Stand up and bring up the camera.
    pub async fn start(&self) -> Result<()> {
        info!("started");
        if let Err(e) = self.parts.body.stand().await {
            warn!(%e, "could not stand");
        }
        if !self.parts.camera.available() {
            error!("media driver not available");
            return Err(FollowError::Unavailable("camera not available".into()));
        }
        if let Err(e) = self.parts.camera.start().await {
            error!(%e, "media driver could not start");
            return Err(FollowError::Unavailable(e.to_string()));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Enter the searching state and launch the seeking pipeline.
    pub async fn begin_seeking(&self) -> Result<()> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(FollowError::Unavailable("behavior was not started".into()));
        }
        let mut slot = self.session.lock().await;
        match slot.as_ref().map(|s| s.mode) {
            Some(Mode::Seeking) => {
                warn!("already seeking");
                return Ok(());
            }
            Some(Mode::Sight) => {
                if let Some(session) = slot.take() {
                    self.end(session).await;
                }
            }
            None => {}
        }
        let direction = self.parts.body.direction().await;
        info!(direction, "begin seeking");

        let shutdown = Shutdown::new();
        let (sweep_tx, sweep_rx) = mpsc::channel(1);
        let (keeper, transitions) = StateKeeper::new(self.status.clone(), sweep_tx);
        let keeper = tokio::spawn(keeper.run());
        let mut behavior = BehaviorHandle::new(
            self.status.subscribe(),
            transitions.clone(),
            shutdown.subscribe(),
        );
        let (view_tx, view_rx) = mpsc::channel(self.config.view_queue_capacity.max(1));
        let (found_tx, found_rx) = found_queue();

        let mut tasks = TaskGroup::new();
        let scanner = Scanner::new(
            self.head.clone(),
            view_tx,
            behavior.clone(),
            self.config.intervals,
        );
        tasks.spawn(scanner.run(sweep_rx));
        let finder = FaceFinder::new(
            self.parts.detector.clone(),
            self.parts.telemetry.clone(),
            found_tx,
            behavior.clone(),
            self.config.view_expiration(),
        )
        .await_on_stop(self.config.await_detections_on_stop);
        tasks.spawn(finder.run(view_rx));
        let confirmer = Confirmer::new(
            self.head.clone(),
            self.parts.detector.clone(),
            behavior.clone(),
            self.config.sweep_step(),
        );
        tasks.spawn(confirmer.run(found_rx));
        let mover = Mover::new(
            self.head.clone(),
            self.parts.range.clone(),
            behavior.clone(),
            self.config.walk_pulse(),
            self.config.min_safe_distance,
        );
        tasks.spawn(mover.run());

        transitions
            .send(Transition::BeginSeeking)
            .map_err(|_| FollowError::Stopped)?;
        *slot = Some(Session {
            mode: Mode::Seeking,
            shutdown,
            transitions: Some(transitions),
            tasks,
            keeper: Some(keeper),
        });
        drop(slot);
        match behavior.wait_for_state(BehaviorState::Searching).await {
            Ok(_) => Ok(()),
            Err(FollowError::Stopped) => {
                info!("stopped before searching began");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stream live frames, standing taller the more faces are visible.
    pub async fn begin_sight(&self) -> Result<()> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(FollowError::Unavailable("behavior was not started".into()));
        }
        let mut slot = self.session.lock().await;
        if slot.is_some() || self.status().state != BehaviorState::Idle {
            warn!("sight ignored while another session runs");
            return Ok(());
        }
        let shutdown = Shutdown::new();
        let sight = Sight::new(
            self.parts.body.clone(),
            self.parts.camera.clone(),
            self.parts.detector.clone(),
            self.parts.telemetry.clone(),
            self.config.sight_interval(),
        );
        let mut tasks = TaskGroup::new();
        tasks.spawn(sight.run(shutdown.subscribe()));
        *slot = Some(Session {
            mode: Mode::Sight,
            shutdown,
            transitions: None,
            tasks,
            keeper: None,
        });
        info!("sight started");
        Ok(())
    }

    /// Cancel the running session and return to idle.
    pub async fn stop(&self) {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => {
                self.end(session).await;
                self.head.rest().await;
            }
            None => debug!("nothing to stop"),
        }
    }

    async fn end(&self, mut session: Session) {
        info!(mode = ?session.mode, "stop received");
        if let Some(transitions) = session.transitions.take() {
            let _ = transitions.send(Transition::Stop);
        }
        session.shutdown.trigger();
        let tasks = std::mem::take(&mut session.tasks);
        tasks.join().await;
        if let Some(keeper) = session.keeper.take() {
            let _ = keeper.await;
        }
        self.status.send_modify(|s| s.state = BehaviorState::Idle);
    }

    /// Stand, tilt to the face pitch and capture one frame for the remote.
    pub async fn take_picture(&self) -> Result<RgbaImage> {
        info!("taking photo");
        self.head.raise().await?;
        let frame = self.parts.camera.snapshot().await?;
        self.parts.telemetry.send_image(&frame);
        Ok(frame)
    }

    /// Stop everything and release the body.
    pub async fn close(&self) {
        self.stop().await;
        self.parts.body.close().await;
    }

    /// Run a parsed command.
    pub async fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::BeginSeeking => self.begin_seeking().await,
            Command::Stop => {
                self.stop().await;
                Ok(())
            }
            Command::TakePicture => self.take_picture().await.map(|_| ()),
            Command::Sight => self.begin_sight().await,
        }
    }
}

#[async_trait]
impl Skill for FollowController {
    async fn on_start(&self) -> Result<()> {
        self.start().await
    }

    async fn on_recv_string(&self, data: &str) {
        info!(%data, "received");
        match data.parse::<Command>() {
            Ok(command) => {
                if let Err(e) = self.dispatch(command).await {
                    error!(?command, %e, "command failed");
                }
            }
            Err(e) => warn!(%e, "ignoring"),
        }
    }

    async fn on_close(&self) {
        self.close().await;
    }
}
