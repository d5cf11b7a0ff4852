#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for dlsim
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/dlsim/config.toml)
//! - Environment variables (`DLSIM_*`)
//! - CLI flags (applied by the binary)

pub mod constants;

use constants::{
    DEFAULT_LOG_DIR, DEFAULT_MAX_CAPACITY, DEFAULT_MAX_REQUEST_UNITS, DEFAULT_MIN_CAPACITY,
    DEFAULT_PROCESSES, DEFAULT_REQUEST_PROBABILITY, DEFAULT_RESOURCES, DEFAULT_STEPS,
    MAX_ENTITIES, MIN_ENTITIES,
};
use dlsim_errors::{ConfigError, Error};
use dlsim_types::{ColorChoice, Mode, OutputFormat, VictimPolicyKind};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub autopilot: AutopilotConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub default_output: OutputFormat,
    #[serde(default)]
    pub color: ColorChoice,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

/// Shape of the simulated system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_processes")]
    pub processes: usize,
    #[serde(default = "default_resources")]
    pub resources: usize,
    #[serde(default = "default_min_capacity")]
    pub min_capacity: u32,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub victim_policy: VictimPolicyKind,
    /// Seed for capacities, maximum demands and autopilot choices
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Scripted driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutopilotConfig {
    #[serde(default = "default_request_probability")]
    pub request_probability: f64,
    #[serde(default = "default_max_request_units")]
    pub max_request_units: u32,
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Run detection after every n-th step in detection mode (0 = never)
    #[serde(default = "default_detect_every")]
    pub detect_every: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
            log_dir: default_log_dir(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            processes: DEFAULT_PROCESSES,
            resources: DEFAULT_RESOURCES,
            min_capacity: DEFAULT_MIN_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            mode: Mode::Detection,
            victim_policy: VictimPolicyKind::FirstInCycle,
            seed: None,
        }
    }
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            request_probability: DEFAULT_REQUEST_PROBABILITY,
            max_request_units: DEFAULT_MAX_REQUEST_UNITS,
            steps: DEFAULT_STEPS,
            detect_every: default_detect_every(),
        }
    }
}

// Default value functions for serde
fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

fn default_processes() -> usize {
    DEFAULT_PROCESSES
}

fn default_resources() -> usize {
    DEFAULT_RESOURCES
}

fn default_min_capacity() -> u32 {
    DEFAULT_MIN_CAPACITY
}

fn default_max_capacity() -> u32 {
    DEFAULT_MAX_CAPACITY
}

fn default_request_probability() -> f64 {
    DEFAULT_REQUEST_PROBABILITY
}

fn default_max_request_units() -> u32 {
    DEFAULT_MAX_REQUEST_UNITS
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_detect_every() -> usize {
    1
}

/// Clamp a process or resource count into the supported range
#[must_use]
pub fn clamp_entities(count: usize) -> usize {
    count.clamp(MIN_ENTITIES, MAX_ENTITIES)
}

impl SimulationConfig {
    /// Process count after clamping to [1, 100]
    #[must_use]
    pub fn clamped_processes(&self) -> usize {
        clamp_entities(self.processes)
    }

    /// Resource count after clamping to [1, 100]
    #[must_use]
    pub fn clamped_resources(&self) -> usize {
        clamp_entities(self.resources)
    }

    /// Range random capacities are drawn from
    #[must_use]
    pub fn capacity_range(&self) -> RangeInclusive<u32> {
        self.min_capacity..=self.max_capacity
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("dlsim").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or holds values rejected by [`Config::validate`].
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // DLSIM_MODE
        if let Ok(mode) = std::env::var("DLSIM_MODE") {
            self.simulation.mode = mode.parse()?;
        }

        // DLSIM_VICTIM_POLICY
        if let Ok(policy) = std::env::var("DLSIM_VICTIM_POLICY") {
            self.simulation.victim_policy = policy.parse()?;
        }

        // DLSIM_PROCESSES
        if let Ok(processes) = std::env::var("DLSIM_PROCESSES") {
            self.simulation.processes =
                processes.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DLSIM_PROCESSES".to_string(),
                    value: processes,
                })?;
        }

        // DLSIM_RESOURCES
        if let Ok(resources) = std::env::var("DLSIM_RESOURCES") {
            self.simulation.resources =
                resources.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DLSIM_RESOURCES".to_string(),
                    value: resources,
                })?;
        }

        // DLSIM_SEED
        if let Ok(seed) = std::env::var("DLSIM_SEED") {
            self.simulation.seed = Some(seed.parse().map_err(|_| ConfigError::InvalidValue {
                field: "DLSIM_SEED".to_string(),
                value: seed,
            })?);
        }

        // DLSIM_OUTPUT
        if let Ok(output) = std::env::var("DLSIM_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "DLSIM_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // DLSIM_COLOR
        if let Ok(color) = std::env::var("DLSIM_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "DLSIM_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        self.validate()
    }

    /// Check value ranges that clamping cannot repair
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero or inverted capacity
    /// range, a request probability outside [0, 1], or a zero request bound.
    pub fn validate(&self) -> Result<(), Error> {
        let sim = &self.simulation;
        if sim.min_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.min_capacity".to_string(),
                value: sim.min_capacity.to_string(),
            }
            .into());
        }
        if sim.min_capacity > sim.max_capacity {
            return Err(ConfigError::InvalidValue {
                field: "simulation.max_capacity".to_string(),
                value: format!("{} (below min_capacity {})", sim.max_capacity, sim.min_capacity),
            }
            .into());
        }

        let auto = &self.autopilot;
        if !(0.0..=1.0).contains(&auto.request_probability) {
            return Err(ConfigError::InvalidValue {
                field: "autopilot.request_probability".to_string(),
                value: auto.request_probability.to_string(),
            }
            .into());
        }
        if auto.max_request_units == 0 {
            return Err(ConfigError::InvalidValue {
                field: "autopilot.max_request_units".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
