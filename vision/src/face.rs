use async_trait::async_trait;
use follow::{FaceDetector, FaceRect, FollowError, Result};
use image::{DynamicImage, RgbaImage};
use rustface::{Detector, ImageData, create_detector_with_model, read_model};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Tuning passed to every detector instance.
#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    pub min_face_size: u32,
    pub score_thresh: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: (u32, u32),
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_face_size: 40,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: (4, 4),
        }
    }
}

/// SeetaFace frontal face detector.
///
/// The model bytes are kept in memory and a fresh detector is built on a
/// blocking thread for every frame, so detections can run concurrently.
#[derive(Clone)]
pub struct SeetaDetector {
    model: Arc<[u8]>,
    settings: DetectorSettings,
}

impl SeetaDetector {
    /// Load the model file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| FollowError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    /// Use an in-memory model. The bytes are validated once up front.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        read_model(Cursor::new(&bytes[..]))
            .map_err(|e| FollowError::Unavailable(format!("face model: {e}")))?;
        Ok(Self {
            model: bytes.into(),
            settings: DetectorSettings::default(),
        })
    }

    pub fn with_settings(mut self, settings: DetectorSettings) -> Self {
        self.settings = settings;
        self
    }

    fn detector(&self) -> Result<Box<dyn Detector>> {
        let model = read_model(Cursor::new(&self.model[..]))
            .map_err(|e| FollowError::Detection(format!("face model: {e}")))?;
        let mut det = create_detector_with_model(model);
        let s = self.settings;
        det.set_min_face_size(s.min_face_size);
        det.set_score_thresh(s.score_thresh);
        det.set_pyramid_scale_factor(s.pyramid_scale_factor);
        det.set_slide_window_step(s.slide_window_step.0, s.slide_window_step.1);
        Ok(det)
    }

    /// Synchronous detection on the calling thread.
    pub fn detect_blocking(&self, image: &RgbaImage) -> Result<Vec<FaceRect>> {
        let mut det = self.detector()?;
        let gray = DynamicImage::ImageRgba8(image.clone()).to_luma8();
        let (w, h) = gray.dimensions();
        let mut data = ImageData::new(&gray, w, h);
        let faces = det
            .detect(&mut data)
            .into_iter()
            .map(|f| {
                let bbox = f.bbox();
                FaceRect {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                }
            })
            .collect::<Vec<_>>();
        debug!(faces = faces.len(), width = w, height = h, "seeta detection");
        Ok(faces)
    }
}

#[async_trait]
impl FaceDetector for SeetaDetector {
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<FaceRect>> {
        let this = self.clone();
        let image = image.clone();
        tokio::task::spawn_blocking(move || this.detect_blocking(&image))
            .await
            .map_err(|e| FollowError::Detection(e.to_string()))?
    }
}
