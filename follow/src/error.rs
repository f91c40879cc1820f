use thiserror::Error;

/// Failures surfaced by the follow behavior and its collaborators.
///
/// Stale views and detection misses are ordinary outcomes and never show up
/// here.
#[derive(Debug, Error)]
pub enum FollowError {
    /// A head, pitch or walk primitive reported an error.
    #[error("motion failed: {0}")]
    Motion(String),
    /// The camera could not deliver a frame.
    #[error("camera error: {0}")]
    Camera(String),
    /// The face detector could not process a frame.
    #[error("detection failed: {0}")]
    Detection(String),
    /// The distance sensor could not be opened or read.
    #[error("distance sensor error: {0}")]
    Sensor(String),
    /// A required resource was missing when the behavior started.
    #[error("resource unavailable: {0}")]
    Unavailable(String),
    /// Configuration values were rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The behavior was stopped or its channels were closed.
    #[error("behavior stopped")]
    Stopped,
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, FollowError>;
