use follow::Telemetry;
use image::RgbaImage;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// [`Telemetry`] that broadcasts frames as base64 JPEG strings.
///
/// Frames are dropped when nobody is listening.
#[derive(Clone)]
pub struct ChannelTelemetry {
    frames: broadcast::Sender<String>,
}

impl ChannelTelemetry {
    pub fn new(frames: broadcast::Sender<String>) -> Self {
        Self { frames }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.frames.subscribe()
    }
}

impl Telemetry for ChannelTelemetry {
    fn send_image(&self, image: &RgbaImage) {
        if self.frames.receiver_count() == 0 {
            trace!("no viewers, frame dropped");
            return;
        }
        match vision::encode_frame(image) {
            Ok(data) => {
                let _ = self.frames.send(data);
            }
            Err(e) => warn!(%e, "could not encode frame"),
        }
    }
}
