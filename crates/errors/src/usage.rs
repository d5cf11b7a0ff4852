//! Usage errors: malformed calls rejected before any mutation

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum UsageError {
    #[error("unknown resource: {resource}")]
    UnknownResource { resource: String },

    #[error("unknown process: {process}")]
    UnknownProcess { process: String },

    #[error("invalid unit count: {units} (must be at least 1)")]
    InvalidUnits { units: u32 },

    #[error("process {process} is terminated")]
    ProcessTerminated { process: String },

    #[error("process {process} is already waiting on a request")]
    ProcessBlocked { process: String },

    #[error("invalid identifier: {value}")]
    InvalidIdentifier { value: String },
}

impl UserFacingError for UsageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownResource { .. } | Self::UnknownProcess { .. } => {
                Some("Check the snapshot for the identifiers of the configured system.")
            }
            Self::InvalidUnits { .. } => Some("Request or release at least one unit."),
            Self::ProcessTerminated { .. } => {
                Some("Terminated processes were chosen as deadlock victims and cannot act again.")
            }
            Self::ProcessBlocked { .. } => {
                Some("Release resources held by other processes so the waiting request can be granted.")
            }
            Self::InvalidIdentifier { .. } => {
                Some("Identifiers look like P0, P1, ... for processes and R0, R1, ... for resources.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ProcessBlocked { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::UnknownResource { .. } => "usage.unknown_resource",
            Self::UnknownProcess { .. } => "usage.unknown_process",
            Self::InvalidUnits { .. } => "usage.invalid_units",
            Self::ProcessTerminated { .. } => "usage.process_terminated",
            Self::ProcessBlocked { .. } => "usage.process_blocked",
            Self::InvalidIdentifier { .. } => "usage.invalid_identifier",
        })
    }
}
