//! Bounds applied when configuring a simulated system

/// Smallest number of processes or resource types a system may have
pub const MIN_ENTITIES: usize = 1;

/// Largest number of processes or resource types a system may have
pub const MAX_ENTITIES: usize = 100;

pub const DEFAULT_PROCESSES: usize = 5;
pub const DEFAULT_RESOURCES: usize = 3;
pub const DEFAULT_MIN_CAPACITY: u32 = 2;
pub const DEFAULT_MAX_CAPACITY: u32 = 4;

pub const DEFAULT_REQUEST_PROBABILITY: f64 = 0.7;
pub const DEFAULT_MAX_REQUEST_UNITS: u32 = 2;
pub const DEFAULT_STEPS: usize = 20;

pub const DEFAULT_LOG_DIR: &str = "logs";
