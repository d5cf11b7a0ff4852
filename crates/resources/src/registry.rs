//! Arena of pools and processes indexed by handle
//!
//! Every mutation that moves units goes through [`Registry::allocate`] or
//! [`Registry::release`] so a pool's `allocated` map and the owning
//! process's `held` map never drift apart.

use crate::{Process, Resource};
use dlsim_errors::UsageError;
use dlsim_types::{ProcessId, ResourceId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: Vec<Resource>,
    processes: Vec<Process>,
}

impl Registry {
    /// Build pools from capacities and processes from per-process ceilings
    ///
    /// `maxima[i][j]` is process `i`'s declared maximum for resource `j`.
    #[must_use]
    pub fn new(capacities: &[u32], maxima: &[Vec<u32>]) -> Self {
        let resources = capacities
            .iter()
            .zip(0u32..)
            .map(|(total, idx)| Resource::new(ResourceId::new(idx), *total))
            .collect();
        let processes = maxima
            .iter()
            .zip(0u32..)
            .map(|(row, idx)| {
                let maximum: BTreeMap<ResourceId, u32> = row
                    .iter()
                    .zip(0u32..)
                    .map(|(units, r)| (ResourceId::new(r), *units))
                    .collect();
                Process::new(ProcessId::new(idx), maximum)
            })
            .collect();
        Self {
            resources,
            processes,
        }
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// # Errors
    ///
    /// Returns [`UsageError::UnknownResource`] for a handle outside the arena.
    pub fn resource(&self, id: ResourceId) -> Result<&Resource, UsageError> {
        self.resources
            .get(id.index())
            .ok_or_else(|| UsageError::UnknownResource {
                resource: id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`UsageError::UnknownProcess`] for a handle outside the arena.
    pub fn process(&self, id: ProcessId) -> Result<&Process, UsageError> {
        self.processes
            .get(id.index())
            .ok_or_else(|| UsageError::UnknownProcess {
                process: id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`UsageError::UnknownProcess`] for a handle outside the arena.
    pub fn process_mut(&mut self, id: ProcessId) -> Result<&mut Process, UsageError> {
        self.processes
            .get_mut(id.index())
            .ok_or_else(|| UsageError::UnknownProcess {
                process: id.to_string(),
            })
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// Available units per resource, in index order
    #[must_use]
    pub fn available(&self) -> Vec<u32> {
        self.resources.iter().map(Resource::available_units).collect()
    }

    /// Move units from a pool to a process and mark the request granted
    ///
    /// Returns `false` when capacity is short or a handle is unknown; nothing
    /// changes in that case.
    pub fn allocate(&mut self, process: ProcessId, resource: ResourceId, units: u32) -> bool {
        let (Some(pool), Some(owner)) = (
            self.resources.get_mut(resource.index()),
            self.processes.get_mut(process.index()),
        ) else {
            return false;
        };
        if !pool.allocate(process, units) {
            return false;
        }
        owner.grant(resource, units);
        true
    }

    /// Return units from a process to a pool, clipped to what it holds
    pub fn release(&mut self, process: ProcessId, resource: ResourceId, units: Option<u32>) -> u32 {
        let (Some(pool), Some(owner)) = (
            self.resources.get_mut(resource.index()),
            self.processes.get_mut(process.index()),
        ) else {
            return 0;
        };
        let actual = pool.release(process, units);
        owner.record_release(resource, actual);
        actual
    }

    /// Release everything a process holds, in resource index order
    pub fn release_all(&mut self, process: ProcessId) -> Vec<(ResourceId, u32)> {
        let held: Vec<ResourceId> = match self.processes.get(process.index()) {
            Some(owner) => owner.held().map(|(rid, _)| rid).collect(),
            None => return Vec::new(),
        };
        held.into_iter()
            .map(|rid| (rid, self.release(process, rid, None)))
            .filter(|(_, units)| *units > 0)
            .collect()
    }

    /// Check pool conservation and the pool/process mirror
    ///
    /// # Errors
    ///
    /// Returns a description of the first broken invariant.
    pub fn verify(&self) -> Result<(), String> {
        for pool in &self.resources {
            if !pool.is_conserved() {
                return Err(format!(
                    "{} is not conserved: available {} of {}",
                    pool.id(),
                    pool.available_units(),
                    pool.total_units()
                ));
            }
            for (pid, units) in pool.holders() {
                let mirrored = self
                    .processes
                    .get(pid.index())
                    .map_or(0, |p| p.held_units(pool.id()));
                if mirrored != units {
                    return Err(format!(
                        "{} holds {units} of {} but its process records {mirrored}",
                        pid,
                        pool.id()
                    ));
                }
            }
        }
        for owner in &self.processes {
            for (rid, units) in owner.held() {
                let pooled = self
                    .resources
                    .get(rid.index())
                    .map_or(0, |r| r.allocated_to(owner.id()));
                if pooled != units {
                    return Err(format!(
                        "{} records {units} of {rid} but the pool allocates {pooled}",
                        owner.id()
                    ));
                }
            }
        }
        Ok(())
    }
}
