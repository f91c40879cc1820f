//! Tunables for the follow behavior.

use crate::{FollowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Behavior configuration.
///
/// Every field has a default so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Number of sweep stops per full rotation.
    pub intervals: u32,
    /// Ground-to-face pitch angle in degrees.
    pub pitch: f64,
    /// Time bound handed to the body for each head movement.
    pub settle_ms: u64,
    /// Pause after a movement before capturing, to avoid motion blur.
    pub post_move_delay_ms: u64,
    /// Views older than this are dropped without detection.
    pub view_expiration_secs: u64,
    /// Bound of the queue between the scanner and the face detector.
    pub view_queue_capacity: usize,
    /// Length of one forward walk pulse while tracking.
    pub walk_pulse_ms: u64,
    /// Readings below this distance suppress the walk pulse. `None` only logs.
    pub min_safe_distance: Option<f64>,
    /// Await in-flight detections on stop instead of aborting them.
    pub await_detections_on_stop: bool,
    /// Delay between frames in live sight mode.
    pub sight_interval_ms: u64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            intervals: 6,
            pitch: 20.0,
            settle_ms: 50,
            post_move_delay_ms: 100,
            view_expiration_secs: 300,
            view_queue_capacity: 1000,
            walk_pulse_ms: 500,
            min_safe_distance: None,
            await_detections_on_stop: false,
            sight_interval_ms: 100,
        }
    }
}

impl FollowConfig {
    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FollowError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| FollowError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the behavior cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.intervals == 0 {
            return Err(FollowError::Config("intervals must be at least 1".into()));
        }
        if self.view_queue_capacity == 0 {
            return Err(FollowError::Config(
                "view_queue_capacity must be at least 1".into(),
            ));
        }
        if !self.pitch.is_finite() {
            return Err(FollowError::Config("pitch must be finite".into()));
        }
        if let Some(d) = self.min_safe_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(FollowError::Config(
                    "min_safe_distance must be a non-negative number".into(),
                ));
            }
        }
        Ok(())
    }

    /// Angular distance between consecutive sweep stops.
    pub fn sweep_step(&self) -> f64 {
        360.0 / f64::from(self.intervals.max(1))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn post_move_delay(&self) -> Duration {
        Duration::from_millis(self.post_move_delay_ms)
    }

    pub fn view_expiration(&self) -> Duration {
        Duration::from_secs(self.view_expiration_secs)
    }

    pub fn walk_pulse(&self) -> Duration {
        Duration::from_millis(self.walk_pulse_ms)
    }

    pub fn sight_interval(&self) -> Duration {
        Duration::from_millis(self.sight_interval_ms)
    }
}
