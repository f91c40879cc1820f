//! Head aiming: the only path from commanded motion to a capture.

use crate::traits::{Body, Camera, Telemetry};
use crate::view::normalize_heading;
use crate::{FollowConfig, Result, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Couples the body and camera so that no frame is captured before the head
/// has settled.
///
/// Every operation holds an internal lock for its whole duration, so motion
/// commands from different stages never interleave.
pub struct Head {
    body: Arc<dyn Body>,
    camera: Arc<dyn Camera>,
    telemetry: Arc<dyn Telemetry>,
    pitch: f64,
    settle: Duration,
    post_move_delay: Duration,
    lock: Mutex<()>,
}

impl Head {
    pub fn new(
        body: Arc<dyn Body>,
        camera: Arc<dyn Camera>,
        telemetry: Arc<dyn Telemetry>,
        config: &FollowConfig,
    ) -> Self {
        Self {
            body,
            camera,
            telemetry,
            pitch: config.pitch,
            settle: config.settle(),
            post_move_delay: config.post_move_delay(),
            lock: Mutex::new(()),
        }
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Turn to `heading`, tilt to the face pitch and wait out motion blur.
    ///
    /// Returns the heading reached, normalized to `[0, 360)`.
    pub async fn aim(&self, heading: f64) -> Result<f64> {
        let _guard = self.lock.lock().await;
        self.aim_locked(heading).await
    }

    async fn aim_locked(&self, heading: f64) -> Result<f64> {
        let heading = normalize_heading(heading);
        if let Err(e) = self.body.move_head(heading, self.settle).await {
            error!(heading, %e, "move head failed");
            return Err(e);
        }
        if let Err(e) = self.body.pitch(self.pitch, self.settle).await {
            error!(pitch = self.pitch, %e, "pitch failed");
            return Err(e);
        }
        tokio::time::sleep(self.post_move_delay).await;
        Ok(heading)
    }

    /// Aim at `heading` and capture a view labelled with `source`.
    pub async fn look(&self, source: &str, heading: f64) -> Result<View> {
        let _guard = self.lock.lock().await;
        let reached = self.aim_locked(heading).await?;
        let image = self.camera.snapshot().await?;
        debug!(source, heading = reached, "captured view");
        Ok(View::captured(source, image, reached, self.pitch))
    }

    /// [`Head::look`], also forwarding the frame to telemetry.
    pub async fn look_and_send(&self, source: &str, heading: f64) -> Result<View> {
        let view = self.look(source, heading).await?;
        self.telemetry.send_image(view.image());
        Ok(view)
    }

    /// Aim at `heading` and walk toward it for one pulse.
    pub async fn pursue(&self, heading: f64, pulse: Duration) -> Result<()> {
        let _guard = self.lock.lock().await;
        let reached = self.aim_locked(heading).await?;
        self.body.walk(reached, pulse).await
    }

    /// Stand and tilt to the face pitch without turning.
    pub async fn raise(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.body.stand().await?;
        self.body.pitch(self.pitch, self.settle).await
    }

    /// Stop walking.
    pub async fn halt(&self) {
        let _guard = self.lock.lock().await;
        self.body.stop_motion().await;
    }

    /// Halt walking, drop the pitch and face forward.
    pub async fn rest(&self) {
        let _guard = self.lock.lock().await;
        self.body.stop_motion().await;
        self.body.stop_pitch().await;
        if let Err(e) = self.body.move_head(0.0, self.settle).await {
            error!(%e, "could not reset head");
        }
    }
}
