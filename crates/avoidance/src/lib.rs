#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock avoidance with the Banker's algorithm
//!
//! [`BankerState`] holds the `available`, `allocation` and `need` matrices
//! alongside each process's declared maximum. Every grant in avoidance mode
//! is probed on scratch copies first and only committed when the resulting
//! state is safe.

mod banker;

pub use banker::{BankerState, Evaluation};
