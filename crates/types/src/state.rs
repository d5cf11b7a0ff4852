//! Process lifecycle and allocation-discipline types

use dlsim_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a simulated process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    #[default]
    Ready,
    Running,
    Waiting,
    /// Chosen as a deadlock victim; never scheduled again
    Terminated,
}

impl ProcessState {
    /// Whether the process may still issue requests or be picked by the autopilot
    #[must_use]
    pub fn is_schedulable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::Waiting => write!(f, "waiting"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Deadlock-handling discipline consulted for each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Grant whatever fits, queue the rest, look for cycles on demand
    #[default]
    Detection,
    /// Enforce strictly increasing resource ranks per process
    Prevention,
    /// Banker's algorithm: only grant requests that keep the system safe
    Avoidance,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Detection, Mode::Prevention, Mode::Avoidance];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detection => "detection",
            Self::Prevention => "prevention",
            Self::Avoidance => "avoidance",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detection" => Ok(Self::Detection),
            "prevention" => Ok(Self::Prevention),
            "avoidance" => Ok(Self::Avoidance),
            _ => Err(ConfigError::InvalidValue {
                field: "mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl clap::ValueEnum for Mode {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}
