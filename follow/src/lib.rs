//! Face-seeking behavior for a hexapod robot.
//!
//! The behavior sweeps the head across evenly spaced headings, looks for
//! faces in each captured [`View`], confirms a candidate by looking again
//! (probing one sweep step to either side when the face moved) and then walks
//! toward the confirmed heading.
//!
//! Four long-running stages form the pipeline:
//!
//! - [`Scanner`] queues one view per sweep stop,
//! - [`FaceFinder`] runs one detection task per fresh view,
//! - [`Confirmer`] re-checks found views one at a time and commits a target,
//! - [`Mover`] pursues the target while tracking.
//!
//! [`FollowController`] owns the [`Status`] and starts or stops the stages as
//! one session. Hardware is reached only through the traits in [`traits`].

pub mod config;
pub mod confirmer;
pub mod controller;
pub mod error;
pub mod finder;
pub mod found;
pub mod head;
pub mod mover;
pub mod scanner;
pub mod sight;
pub mod skill;
pub mod state;
pub mod task_group;
pub mod traits;
pub mod view;

pub use config::FollowConfig;
pub use confirmer::{Confirmation, Confirmer};
pub use controller::{Collaborators, FollowController};
pub use error::{FollowError, Result};
pub use finder::FaceFinder;
pub use found::{FoundReceiver, FoundSender, found_queue};
pub use head::Head;
pub use mover::{Mover, Pulse};
pub use scanner::Scanner;
pub use sight::Sight;
pub use skill::{Command, Skill};
pub use state::{BehaviorHandle, BehaviorState, Shutdown, StateKeeper, Status, Transition};
pub use task_group::TaskGroup;
pub use traits::{
    Body, Camera, FaceDetector, FaceRect, NoopTelemetry, RangeFinder, RangeReading, Telemetry,
};
pub use view::{View, normalize_heading};
