//! Boundary between the host runtime and the behavior.

use async_trait::async_trait;
use std::str::FromStr;

/// Inbound command tokens understood by the behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BeginSeeking,
    Stop,
    TakePicture,
    Sight,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim() {
            "start" | "seek" | "spinAround" => Ok(Command::BeginSeeking),
            "stop" => Ok(Command::Stop),
            "pic" => Ok(Command::TakePicture),
            "sight" => Ok(Command::Sight),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

/// Lifecycle callbacks the host invokes on a skill.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Bring up drivers. Errors mean the skill cannot run.
    async fn on_start(&self) -> crate::Result<()>;
    /// Handle an opaque string received from the remote.
    async fn on_recv_string(&self, data: &str);
    /// Release drivers before the host exits.
    async fn on_close(&self);
}
