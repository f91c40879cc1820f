//! Host runtime for the follow skill.
//!
//! Wires simulated (or real) collaborators into a
//! [`follow::FollowController`] and exposes it to a remote over WebSocket.

pub mod logging;
pub mod sim;
pub mod telemetry;
pub mod web;

pub use logging::init_logging;
pub use sim::{SimBody, SimCamera, SimDetector, SimRangeFinder};
pub use telemetry::ChannelTelemetry;
pub use web::{AppState, app};

use follow::{Collaborators, FaceDetector, FollowConfig, FollowController};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the telemetry frame channel.
pub const FRAME_CAPACITY: usize = 16;

/// Build a controller driving the simulated robot.
///
/// `detector` replaces the simulated detector when given.
pub fn simulated_controller(
    config: FollowConfig,
    face_at: f64,
    distance: f64,
    detector: Option<Arc<dyn FaceDetector>>,
    frames: broadcast::Sender<String>,
) -> FollowController {
    let body = Arc::new(SimBody::new());
    let camera = Arc::new(SimCamera::new(
        body.clone(),
        face_at,
        config.sweep_step() / 2.0,
    ));
    let range = Arc::new(SimRangeFinder::new(body.clone(), distance));
    let detector = detector.unwrap_or_else(|| Arc::new(SimDetector));
    FollowController::new(
        config,
        Collaborators {
            body,
            camera,
            detector,
            telemetry: Arc::new(ChannelTelemetry::new(frames)),
            range,
        },
    )
}
