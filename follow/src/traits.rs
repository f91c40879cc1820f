//! Capabilities the host runtime provides to the behavior.

use crate::Result;
use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rectangular face region in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Motion primitives of the hexapod body.
#[async_trait]
pub trait Body: Send + Sync {
    /// Turn the head to `heading` degrees, completing within `settle`.
    async fn move_head(&self, heading: f64, settle: Duration) -> Result<()>;
    /// Tilt the body so the head points `angle` degrees upward.
    async fn pitch(&self, angle: f64, duration: Duration) -> Result<()>;
    /// Walk toward `heading` for `duration`, returning once the pulse is over.
    async fn walk(&self, heading: f64, duration: Duration) -> Result<()>;
    /// Current heading reported by the body.
    async fn direction(&self) -> f64;
    async fn stand(&self) -> Result<()>;
    async fn stand_with_height(&self, height: f64) -> Result<()>;
    async fn stop_pitch(&self);
    async fn stop_motion(&self);
    /// Release the body driver.
    async fn close(&self);
}

/// Camera delivering RGBA frames.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Whether a camera driver is present at all.
    fn available(&self) -> bool;
    async fn start(&self) -> Result<()>;
    async fn snapshot(&self) -> Result<RgbaImage>;
}

/// Locates faces in a frame. An empty result means no face.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<FaceRect>>;
}

/// Fire-and-forget transport of frames to a remote viewer.
pub trait Telemetry: Send + Sync {
    fn send_image(&self, image: &RgbaImage);
}

/// Distance sensor with scoped access.
///
/// Each [`RangeFinder::open`] yields a [`RangeReading`] that releases the
/// sensor when dropped.
#[async_trait]
pub trait RangeFinder: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RangeReading>>;
}

/// An open distance sensor.
#[async_trait]
pub trait RangeReading: Send {
    async fn read(&mut self) -> Result<f64>;
}

/// [`Telemetry`] that discards every frame.
#[derive(Clone, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn send_image(&self, _image: &RgbaImage) {}
}
