//! Simulated hexapod hardware for running the behavior without a robot.
//!
//! The camera renders a white square whenever the head points within half a
//! sweep step of the configured face heading, and [`SimDetector`] reports
//! that square as a face.

use async_trait::async_trait;
use follow::{
    Body, Camera, FaceDetector, FaceRect, FollowError, RangeFinder, RangeReading, Result,
    normalize_heading,
};
use image::{Luma, Rgba, RgbaImage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

pub const FRAME_WIDTH: u32 = 64;
pub const FRAME_HEIGHT: u32 = 48;
const FACE_SIZE: u32 = 16;
/// Walking speed in distance units per second.
const WALK_SPEED: f64 = 20.0;

#[derive(Debug, Default)]
struct Pose {
    direction: f64,
    pitch: f64,
    height: f64,
    travelled: f64,
}

/// Body that tracks its pose and sleeps through each movement.
#[derive(Default)]
pub struct SimBody {
    pose: Mutex<Pose>,
}

impl SimBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance walked so far.
    pub fn travelled(&self) -> f64 {
        self.pose.lock().unwrap().travelled
    }
}

#[async_trait]
impl Body for SimBody {
    async fn move_head(&self, heading: f64, settle: Duration) -> Result<()> {
        if !heading.is_finite() {
            return Err(FollowError::Motion(format!("bad heading {heading}")));
        }
        tokio::time::sleep(settle).await;
        self.pose.lock().unwrap().direction = normalize_heading(heading);
        debug!(heading, "sim move head");
        Ok(())
    }

    async fn pitch(&self, angle: f64, duration: Duration) -> Result<()> {
        tokio::time::sleep(duration).await;
        self.pose.lock().unwrap().pitch = angle;
        Ok(())
    }

    async fn walk(&self, heading: f64, duration: Duration) -> Result<()> {
        info!(heading, ms = duration.as_millis() as u64, "sim walk");
        tokio::time::sleep(duration).await;
        self.pose.lock().unwrap().travelled += duration.as_secs_f64() * WALK_SPEED;
        Ok(())
    }

    async fn direction(&self) -> f64 {
        self.pose.lock().unwrap().direction
    }

    async fn stand(&self) -> Result<()> {
        debug!("sim stand");
        Ok(())
    }

    async fn stand_with_height(&self, height: f64) -> Result<()> {
        self.pose.lock().unwrap().height = height;
        debug!(height, "sim stand with height");
        Ok(())
    }

    async fn stop_pitch(&self) {
        self.pose.lock().unwrap().pitch = 0.0;
    }

    async fn stop_motion(&self) {
        debug!("sim stop motion");
    }

    async fn close(&self) {
        info!("sim body closed");
    }
}

/// Camera that sees a face only when facing `face_at`.
pub struct SimCamera {
    body: Arc<SimBody>,
    face_at: f64,
    tolerance: f64,
}

impl SimCamera {
    pub fn new(body: Arc<SimBody>, face_at: f64, tolerance: f64) -> Self {
        Self {
            body,
            face_at: normalize_heading(face_at),
            tolerance,
        }
    }

    fn sees_face(&self, direction: f64) -> bool {
        let diff = (direction - self.face_at).abs() % 360.0;
        diff.min(360.0 - diff) <= self.tolerance
    }
}

#[async_trait]
impl Camera for SimCamera {
    fn available(&self) -> bool {
        true
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<RgbaImage> {
        let direction = self.body.direction().await;
        let mut frame = RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgba([20, 20, 20, 255]));
        if self.sees_face(direction) {
            let x0 = (FRAME_WIDTH - FACE_SIZE) / 2;
            let y0 = (FRAME_HEIGHT - FACE_SIZE) / 2;
            for y in y0..y0 + FACE_SIZE {
                for x in x0..x0 + FACE_SIZE {
                    frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
                }
            }
        }
        Ok(frame)
    }
}

/// Reports the bounding box of pure white pixels as a single face.
#[derive(Clone, Default)]
pub struct SimDetector;

#[async_trait]
impl FaceDetector for SimDetector {
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<FaceRect>> {
        let gray = image::DynamicImage::ImageRgba8(image.clone()).to_luma8();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, Luma([v])) in gray.enumerate_pixels() {
            if *v == 255 {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        Ok(bounds
            .map(|(x0, y0, x1, y1)| FaceRect {
                x: x0 as i32,
                y: y0 as i32,
                width: x1 - x0 + 1,
                height: y1 - y0 + 1,
            })
            .into_iter()
            .collect())
    }
}

/// Distance to the face, shrinking as the body walks.
pub struct SimRangeFinder {
    body: Arc<SimBody>,
    start: f64,
}

impl SimRangeFinder {
    pub fn new(body: Arc<SimBody>, start: f64) -> Self {
        Self { body, start }
    }
}

struct SimReading {
    distance: f64,
}

#[async_trait]
impl RangeReading for SimReading {
    async fn read(&mut self) -> Result<f64> {
        Ok(self.distance)
    }
}

#[async_trait]
impl RangeFinder for SimRangeFinder {
    async fn open(&self) -> Result<Box<dyn RangeReading>> {
        let distance = (self.start - self.body.travelled()).max(0.0);
        Ok(Box::new(SimReading { distance }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn camera_sees_face_only_near_heading() {
        let body = Arc::new(SimBody::new());
        let camera = SimCamera::new(body.clone(), 180.0, 30.0);
        let detector = SimDetector;

        body.move_head(0.0, Duration::ZERO).await.unwrap();
        let frame = camera.snapshot().await.unwrap();
        assert!(detector.detect(&frame).await.unwrap().is_empty());

        body.move_head(200.0, Duration::ZERO).await.unwrap();
        let frame = camera.snapshot().await.unwrap();
        let faces = detector.detect(&frame).await.unwrap();
        assert_eq!(
            faces,
            [FaceRect {
                x: 24,
                y: 16,
                width: 16,
                height: 16
            }]
        );
    }

    #[test]
    fn face_tolerance_wraps_north() {
        let camera = SimCamera::new(Arc::new(SimBody::new()), 350.0, 30.0);
        assert!(camera.sees_face(10.0));
        assert!(!camera.sees_face(60.0));
    }

    #[tokio::test]
    async fn range_shrinks_while_walking() {
        let body = Arc::new(SimBody::new());
        let range = SimRangeFinder::new(body.clone(), 100.0);
        body.walk(0.0, Duration::from_millis(500)).await.unwrap();
        let mut reading = range.open().await.unwrap();
        assert_eq!(reading.read().await.unwrap(), 90.0);
    }
}
