//! Domain outcomes of a well-formed request

use crate::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was refused by the active discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    /// Prevention: the resource does not rank above everything already held
    OrderingViolation {
        resource: ResourceId,
        highest_held: ResourceId,
    },
    /// Avoidance: the post-grant state fails the safety search
    UnsafeState,
    /// Avoidance: more than the process's remaining need
    ExceedsMaximumDemand { requested: u32, need: u32 },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrderingViolation {
                resource,
                highest_held,
            } => write!(
                f,
                "violates resource ordering ({resource} does not rank above held {highest_held})"
            ),
            Self::UnsafeState => write!(f, "would lead to unsafe state"),
            Self::ExceedsMaximumDemand { requested, need } => {
                write!(f, "exceeds maximum demand (requested {requested}, need {need})")
            }
        }
    }
}

/// Result of a request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestOutcome {
    Granted,
    /// Capacity unavailable; the request joined the waiting queue
    Waiting,
    Denied(DenialReason),
}

impl RequestOutcome {
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "GRANTED"),
            Self::Waiting => write!(f, "WAITING - resource not available"),
            Self::Denied(reason) => write!(f, "DENIED - {reason}"),
        }
    }
}
