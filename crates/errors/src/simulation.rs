//! Simulation-level error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationError {
    #[error("simulation has no processes or resources configured")]
    NotConfigured,

    #[error("invariant violated: {message}")]
    InvariantViolated { message: String },
}

impl UserFacingError for SimulationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotConfigured => Some("Configure at least one process and one resource."),
            Self::InvariantViolated { .. } => Some("This is a bug in the allocator; please report it."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotConfigured => "simulation.not_configured",
            Self::InvariantViolated { .. } => "simulation.invariant_violated",
        })
    }
}
