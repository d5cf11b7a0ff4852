//! Command line interface definition

use clap::{Parser, Subcommand, ValueEnum};
use dlsim_types::{ColorChoice, Mode, VictimPolicyKind};
use std::path::PathBuf;

/// dlsim - Deadlock detection, prevention and avoidance simulator
#[derive(Parser)]
#[command(name = "dlsim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadlock detection, prevention and avoidance simulator")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the configured log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Shape of the simulated system, overriding the config file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SystemArgs {
    /// Deadlock-handling discipline
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Number of processes (clamped to 1-100)
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Number of resource types (clamped to 1-100)
    #[arg(short, long)]
    pub resources: Option<usize>,

    /// Seed for capacities, maximum demands and autopilot choices
    #[arg(long)]
    pub seed: Option<u64>,

    /// Victim selection policy for deadlock recovery
    #[arg(long, value_enum)]
    pub victim_policy: Option<VictimPolicyKind>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Configure a random system and drive it with random requests
    Run {
        #[command(flatten)]
        system: SystemArgs,

        /// Number of autopilot steps
        #[arg(short, long)]
        steps: Option<usize>,

        /// Audit every invariant after each step
        #[arg(long)]
        verify: bool,
    },

    /// Replay a built-in textbook scenario
    Scenario {
        /// Scenario to replay
        #[arg(value_enum)]
        name: ScenarioName,
    },

    /// Configure a random system and print its initial state
    Snapshot {
        #[command(flatten)]
        system: SystemArgs,
    },
}

/// Built-in scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioName {
    /// Classic Banker's algorithm example with totals {10,5,7}
    Banker,
    /// Two processes waiting on each other's resource
    Detection,
    /// Requests against a fixed resource ordering
    Prevention,
}

impl Commands {
    pub fn system(&self) -> Option<&SystemArgs> {
        match self {
            Self::Run { system, .. } | Self::Snapshot { system } => Some(system),
            Self::Scenario { .. } => None,
        }
    }
}
