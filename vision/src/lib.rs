//! Face detection and frame encoding for the follow behavior.
//!
//! [`face::SeetaDetector`] implements [`follow::FaceDetector`] with the
//! SeetaFace frontal cascade from `rustface`. [`encode`] turns frames into
//! the base64 JPEG strings the remote viewer expects.

pub mod encode;
pub mod face;

pub use encode::{decode_frame, encode_frame};
pub use face::{DetectorSettings, SeetaDetector};
