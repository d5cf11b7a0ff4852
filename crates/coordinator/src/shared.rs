//! Single-lock handle for driving one coordinator from many tasks

use crate::Coordinator;
use dlsim_errors::{SimulationError, UsageError};
use dlsim_types::{Mode, ProcessId, RequestOutcome, ResourceId, Snapshot};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle; every operation holds the one lock for its full
/// duration, so no caller sees a half-applied grant
#[derive(Debug, Clone)]
pub struct SharedCoordinator {
    inner: Arc<Mutex<Coordinator>>,
}

impl SharedCoordinator {
    #[must_use]
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(coordinator)),
        }
    }

    /// Hold the lock across several operations
    pub async fn lock(&self) -> MutexGuard<'_, Coordinator> {
        self.inner.lock().await
    }

    /// # Errors
    ///
    /// See [`Coordinator::request`].
    pub async fn request(
        &self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> Result<RequestOutcome, UsageError> {
        self.inner.lock().await.request(process, resource, units)
    }

    /// # Errors
    ///
    /// See [`Coordinator::release`].
    pub async fn release(
        &self,
        process: ProcessId,
        resource: ResourceId,
        units: Option<u32>,
    ) -> Result<u32, UsageError> {
        self.inner.lock().await.release(process, resource, units)
    }

    pub async fn set_mode(&self, mode: Mode) {
        self.inner.lock().await.set_mode(mode);
    }

    pub async fn detect(&self) -> bool {
        self.inner.lock().await.detect()
    }

    /// # Errors
    ///
    /// See [`Coordinator::auto_step`].
    pub async fn auto_step(&self) -> Result<String, SimulationError> {
        self.inner.lock().await.auto_step()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.lock().await.snapshot()
    }

    /// # Errors
    ///
    /// See [`Coordinator::check_invariants`].
    pub async fn check_invariants(&self) -> Result<(), SimulationError> {
        self.inner.lock().await.check_invariants()
    }
}
