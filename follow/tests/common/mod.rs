#![allow(dead_code)]

use async_trait::async_trait;
use follow::{
    BehaviorHandle, BehaviorState, Body, Camera, FaceDetector, FaceRect, FollowConfig,
    FollowError, RangeFinder, RangeReading, Result, Shutdown, StateKeeper, Status, Telemetry,
    Transition,
};
use image::{Rgba, RgbaImage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Config with millisecond motion timings so tests run quickly.
pub fn fast_config() -> FollowConfig {
    FollowConfig {
        settle_ms: 1,
        post_move_delay_ms: 1,
        walk_pulse_ms: 5,
        sight_interval_ms: 5,
        ..FollowConfig::default()
    }
}

/// Frame whose first pixel records the heading it was taken at.
pub fn frame_at(heading: f64) -> RgbaImage {
    let h = heading.round() as u32;
    RgbaImage::from_pixel(4, 4, Rgba([(h / 256) as u8, (h % 256) as u8, 0, 255]))
}

pub fn heading_of(image: &RgbaImage) -> i64 {
    let p = image.get_pixel(0, 0);
    i64::from(p[0]) * 256 + i64::from(p[1])
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyCall {
    MoveHead(f64),
    Pitch(f64),
    Walk(f64),
    Stand,
    StandHeight(f64),
    StopPitch,
    StopMotion,
    Close,
}

/// Body that records each command and fails on chosen headings.
#[derive(Default)]
pub struct StubBody {
    pub calls: Mutex<Vec<BodyCall>>,
    pub direction: Mutex<f64>,
    pub fail_at: Mutex<HashSet<i64>>,
}

impl StubBody {
    pub fn failing_at(headings: &[i64]) -> Self {
        let body = Self::default();
        body.fail_at.lock().unwrap().extend(headings);
        body
    }

    pub fn calls(&self) -> Vec<BodyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn walks(&self) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BodyCall::Walk(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BodyCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Body for StubBody {
    async fn move_head(&self, heading: f64, settle: Duration) -> Result<()> {
        if self.fail_at.lock().unwrap().contains(&(heading.round() as i64)) {
            return Err(FollowError::Motion(format!("blocked at {heading}")));
        }
        tokio::time::sleep(settle).await;
        *self.direction.lock().unwrap() = heading;
        self.record(BodyCall::MoveHead(heading));
        Ok(())
    }

    async fn pitch(&self, angle: f64, _duration: Duration) -> Result<()> {
        self.record(BodyCall::Pitch(angle));
        Ok(())
    }

    async fn walk(&self, heading: f64, duration: Duration) -> Result<()> {
        self.record(BodyCall::Walk(heading));
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn direction(&self) -> f64 {
        *self.direction.lock().unwrap()
    }

    async fn stand(&self) -> Result<()> {
        self.record(BodyCall::Stand);
        Ok(())
    }

    async fn stand_with_height(&self, height: f64) -> Result<()> {
        self.record(BodyCall::StandHeight(height));
        Ok(())
    }

    async fn stop_pitch(&self) {
        self.record(BodyCall::StopPitch);
    }

    async fn stop_motion(&self) {
        self.record(BodyCall::StopMotion);
    }

    async fn close(&self) {
        self.record(BodyCall::Close);
    }
}

/// Camera that photographs whatever heading the stub body faces.
pub struct StubCamera {
    pub body: Arc<StubBody>,
    pub available: bool,
    pub shots: AtomicUsize,
}

impl StubCamera {
    pub fn new(body: Arc<StubBody>) -> Self {
        Self {
            body,
            available: true,
            shots: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Camera for StubCamera {
    fn available(&self) -> bool {
        self.available
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<RgbaImage> {
        self.shots.fetch_add(1, Ordering::SeqCst);
        let heading = *self.body.direction.lock().unwrap();
        Ok(frame_at(heading))
    }
}

/// Detector reporting a face only in frames taken at the listed headings.
#[derive(Default)]
pub struct StubDetector {
    pub faces_at: Mutex<HashSet<i64>>,
    pub calls: AtomicUsize,
    pub finished: AtomicUsize,
    pub delay: Duration,
}

impl StubDetector {
    pub fn at(headings: &[i64]) -> Self {
        let detector = Self::default();
        detector.faces_at.lock().unwrap().extend(headings);
        detector
    }

    /// Each detection takes `delay` before answering.
    pub fn slow(headings: &[i64], delay: Duration) -> Self {
        Self {
            delay,
            ..Self::at(headings)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FaceDetector for StubDetector {
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<FaceRect>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        if self.faces_at.lock().unwrap().contains(&heading_of(image)) {
            Ok(vec![FaceRect {
                x: 1,
                y: 1,
                width: 2,
                height: 2,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

#[derive(Default)]
pub struct CountingTelemetry {
    pub sent: AtomicUsize,
}

impl CountingTelemetry {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Telemetry for CountingTelemetry {
    fn send_image(&self, _image: &RgbaImage) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }
}

/// Distance sensor with a settable reading that counts opens and closes.
pub struct StubRange {
    pub distance: Mutex<Option<f64>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub broken: AtomicBool,
}

impl StubRange {
    pub fn reading(distance: f64) -> Self {
        Self {
            distance: Mutex::new(Some(distance)),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            broken: AtomicBool::new(false),
        }
    }

    pub fn set(&self, distance: f64) {
        *self.distance.lock().unwrap() = Some(distance);
    }
}

struct StubReading {
    distance: Option<f64>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RangeReading for StubReading {
    async fn read(&mut self) -> Result<f64> {
        self.distance
            .ok_or_else(|| FollowError::Sensor("no echo".into()))
    }
}

impl Drop for StubReading {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RangeFinder for StubRange {
    async fn open(&self) -> Result<Box<dyn RangeReading>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(FollowError::Sensor("not connected".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubReading {
            distance: *self.distance.lock().unwrap(),
            closed: self.closed.clone(),
        }))
    }
}

/// Handle pinned to a fixed status, for driving one stage in isolation.
pub struct Pinned {
    pub handle: BehaviorHandle,
    pub status: watch::Sender<Status>,
    pub transitions: mpsc::UnboundedReceiver<Transition>,
    pub shutdown: Shutdown,
}

pub fn pinned(state: BehaviorState, target: Option<f64>) -> Pinned {
    let (status, status_rx) = watch::channel(Status { state, target });
    let (tx, transitions) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let handle = BehaviorHandle::new(status_rx, tx, shutdown.subscribe());
    Pinned {
        handle,
        status,
        transitions,
        shutdown,
    }
}

/// A running [`StateKeeper`] already moved to the searching state.
pub struct Kept {
    pub handle: BehaviorHandle,
    pub status: Arc<watch::Sender<Status>>,
    pub sweeps: mpsc::Receiver<()>,
    pub shutdown: Shutdown,
}

pub async fn searching() -> Kept {
    let status = Arc::new(watch::channel(Status::default()).0);
    let (sweep_tx, mut sweeps) = mpsc::channel(1);
    let (keeper, tx) = StateKeeper::new(status.clone(), sweep_tx);
    tokio::spawn(keeper.run());
    let shutdown = Shutdown::new();
    let mut handle = BehaviorHandle::new(status.subscribe(), tx, shutdown.subscribe());
    handle.request(Transition::BeginSeeking);
    handle
        .wait_for_state(BehaviorState::Searching)
        .await
        .expect("searching");
    sweeps.recv().await.expect("initial sweep request");
    Kept {
        handle,
        status,
        sweeps,
        shutdown,
    }
}
