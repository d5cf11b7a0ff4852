#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the dlsim deadlock simulator
//!
//! This crate provides the handles, lifecycle states, request outcomes and
//! snapshot types shared by the engine crates and the CLI.

pub mod ids;
pub mod outcome;
pub mod policy;
pub mod snapshot;
pub mod state;

pub use ids::{ProcessId, ResourceId};
pub use outcome::{DenialReason, RequestOutcome};
pub use policy::VictimPolicyKind;
pub use snapshot::{BankerView, Counters, ProcessView, ResourceView, Snapshot, Units, WaitingView};
pub use state::{Mode, ProcessState};

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
