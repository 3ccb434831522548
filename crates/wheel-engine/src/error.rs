//! Error types surfaced to hosts.

use thiserror::Error;

use crate::core::physics::PhysicsError;

/// Errors that can occur while configuring or building a wheel round.
#[derive(Debug, Error)]
pub enum WheelError {
    /// A configuration value is out of range. Nothing was allocated.
    #[error("invalid wheel configuration: {0}")]
    InvalidConfig(String),

    /// The physics world could not be created or rejected a body.
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Configuration JSON could not be parsed.
    #[error("failed to parse wheel configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl WheelError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        WheelError::InvalidConfig(message.into())
    }
}
