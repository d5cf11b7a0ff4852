#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Resource pools and process bookkeeping for dlsim
//!
//! Pools track capacity and per-process allocations, processes track their
//! lifecycle and holdings, and the [`Registry`] owns both and keeps them
//! consistent.

mod pool;
mod process;
mod registry;

pub use pool::Resource;
pub use process::Process;
pub use registry::Registry;
