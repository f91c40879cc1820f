use crate::Result;
use crate::traits::{Body, Camera, FaceDetector, Telemetry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Stand height added per visible face.
pub const HEIGHT_PER_FACE: f64 = 50.0;

/// Live view: stream frames and raise the body as more faces appear.
pub struct Sight {
    body: Arc<dyn Body>,
    camera: Arc<dyn Camera>,
    detector: Arc<dyn FaceDetector>,
    telemetry: Arc<dyn Telemetry>,
    interval: Duration,
}

impl Sight {
    pub fn new(
        body: Arc<dyn Body>,
        camera: Arc<dyn Camera>,
        detector: Arc<dyn FaceDetector>,
        telemetry: Arc<dyn Telemetry>,
        interval: Duration,
    ) -> Self {
        Self {
            body,
            camera,
            detector,
            telemetry,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                res = self.glance() => {
                    if let Err(e) = res {
                        warn!(%e, "sight frame failed");
                    }
                }
            }
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Capture, stream and inspect one frame. Returns the face count.
    pub async fn glance(&self) -> Result<usize> {
        let frame = self.camera.snapshot().await?;
        self.telemetry.send_image(&frame);
        let faces = self.detector.detect(&frame).await?;
        debug!(faces = faces.len(), "sight frame");
        self.body
            .stand_with_height(faces.len() as f64 * HEIGHT_PER_FACE)
            .await?;
        Ok(faces.len())
    }
}
