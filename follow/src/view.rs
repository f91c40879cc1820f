use chrono::{DateTime, Utc};
use image::RgbaImage;
use std::time::Duration;

/// Wrap `heading` into `[0, 360)`.
pub fn normalize_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// A frame captured once the head settled at a heading and pitch.
///
/// Views are immutable: the image and timestamp are fixed at construction
/// and the image is owned by the view until it is consumed.
#[derive(Debug)]
pub struct View {
    id: String,
    image: RgbaImage,
    heading: f64,
    pitch: f64,
    captured_at: DateTime<Utc>,
}

impl View {
    /// Wrap a freshly captured `image`. The id is `<source>-<heading>`.
    pub fn captured(source: &str, image: RgbaImage, heading: f64, pitch: f64) -> Self {
        Self::captured_at(source, image, heading, pitch, Utc::now())
    }

    /// Wrap an image captured at a known moment.
    pub fn captured_at(
        source: &str,
        image: RgbaImage,
        heading: f64,
        pitch: f64,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let heading = normalize_heading(heading);
        Self {
            id: format!("{source}-{}", heading.round() as i64),
            image,
            heading,
            pitch,
            captured_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Moment the frame was captured.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Time elapsed since capture. Views stamped in the future have zero age.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the view is older than `expiration`.
    pub fn is_expired(&self, expiration: Duration) -> bool {
        self.age() > expiration
    }
}
