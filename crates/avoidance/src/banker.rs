//! Banker matrices and the safety search

use dlsim_resources::Registry;
use dlsim_types::{BankerView, ProcessId, ResourceId, Units};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the Banker would answer a request right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// More than the remaining need for that resource
    ExceedsNeed { need: u32 },
    /// Fewer units available than requested; the caller queues the request
    Insufficient,
    /// The post-grant state has no completion order
    Unsafe,
    Safe,
}

/// Matrices indexed `[process][resource]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerState {
    available: Vec<u32>,
    maximum: Vec<Vec<u32>>,
    allocation: Vec<Vec<u32>>,
    need: Vec<Vec<u32>>,
    /// Terminated processes never finish or block the search
    retired: Vec<bool>,
}

impl BankerState {
    /// Fresh state with nothing allocated, so `need == maximum`
    #[must_use]
    pub fn new(available: Vec<u32>, maximum: Vec<Vec<u32>>) -> Self {
        let resources = available.len();
        let processes = maximum.len();
        Self {
            available,
            need: maximum.clone(),
            maximum,
            allocation: vec![vec![0; resources]; processes],
            retired: vec![false; processes],
        }
    }

    /// Rebuild from live pools and holdings
    ///
    /// A maximum below the current holding is raised to that holding so
    /// `need` never goes negative.
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        let resources = registry.resource_count();
        let available = registry.available();
        let mut state = Self {
            available,
            ..Self::default()
        };
        for process in registry.processes() {
            let mut maximum = Vec::with_capacity(resources);
            let mut allocation = Vec::with_capacity(resources);
            for rid in (0u32..).take(resources).map(ResourceId::new) {
                let held = process.held_units(rid);
                maximum.push(process.maximum_for(rid).max(held));
                allocation.push(held);
            }
            state.need.push(
                maximum
                    .iter()
                    .zip(&allocation)
                    .map(|(max, held)| max - held)
                    .collect(),
            );
            state.maximum.push(maximum);
            state.allocation.push(allocation);
            state.retired.push(process.is_terminated());
        }
        state
    }

    #[must_use]
    pub fn need(&self, process: ProcessId, resource: ResourceId) -> u32 {
        cell(&self.need, process, resource)
    }

    #[must_use]
    pub fn allocation(&self, process: ProcessId, resource: ResourceId) -> u32 {
        cell(&self.allocation, process, resource)
    }

    #[must_use]
    pub fn available(&self, resource: ResourceId) -> u32 {
        self.available.get(resource.index()).copied().unwrap_or(0)
    }

    /// Decide a request without touching any state
    #[must_use]
    pub fn evaluate(&self, process: ProcessId, resource: ResourceId, units: u32) -> Evaluation {
        let need = self.need(process, resource);
        if units > need {
            return Evaluation::ExceedsNeed { need };
        }
        if units > self.available(resource) {
            return Evaluation::Insufficient;
        }
        if self.is_safe(process, resource, units) {
            Evaluation::Safe
        } else {
            Evaluation::Unsafe
        }
    }

    /// Whether granting `units` of `resource` to `process` leaves a safe state
    ///
    /// The grant is simulated on copies; `self` is never modified.
    #[must_use]
    pub fn is_safe(&self, process: ProcessId, resource: ResourceId, units: u32) -> bool {
        let (p, r) = (process.index(), resource.index());
        if p >= self.need.len() || r >= self.available.len() {
            return false;
        }
        if units > self.available[r] || units > self.need[p][r] {
            return false;
        }

        let mut work = self.available.clone();
        let mut allocation = self.allocation.clone();
        let mut need = self.need.clone();
        work[r] -= units;
        allocation[p][r] += units;
        need[p][r] -= units;

        let mut finish = self.retired.clone();
        loop {
            let mut progressed = false;
            for (idx, done) in finish.iter_mut().enumerate() {
                if *done || !fits(&need[idx], &work) {
                    continue;
                }
                for (slot, held) in work.iter_mut().zip(&allocation[idx]) {
                    *slot += held;
                }
                *done = true;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
        finish.iter().all(|done| *done)
    }

    /// Apply a grant the pool has already made
    pub fn commit(&mut self, process: ProcessId, resource: ResourceId, units: u32) {
        let (p, r) = (process.index(), resource.index());
        if let (Some(avail), Some(row)) = (self.available.get_mut(r), self.allocation.get_mut(p)) {
            *avail = avail.saturating_sub(units);
            row[r] += units;
            self.need[p][r] = self.need[p][r].saturating_sub(units);
        }
    }

    /// Mirror units the pool took back from a process
    pub fn release(&mut self, process: ProcessId, resource: ResourceId, units: u32) {
        let (p, r) = (process.index(), resource.index());
        if let (Some(avail), Some(row)) = (self.available.get_mut(r), self.allocation.get_mut(p)) {
            let actual = units.min(row[r]);
            *avail += actual;
            row[r] -= actual;
            self.need[p][r] += actual;
        }
    }

    /// Drop a terminated process from future safety searches
    pub fn retire(&mut self, process: ProcessId) {
        if let Some(flag) = self.retired.get_mut(process.index()) {
            *flag = true;
        }
    }

    /// Check `need == maximum - allocation`, and that `available`,
    /// `allocation` and `maximum` match the pools and processes
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch.
    pub fn verify(&self, registry: &Registry) -> Result<(), String> {
        if self.available != registry.available() {
            return Err(format!(
                "banker available {:?} differs from pools {:?}",
                self.available,
                registry.available()
            ));
        }
        if self.allocation.len() != registry.process_count() {
            return Err(format!(
                "banker tracks {} processes, registry has {}",
                self.allocation.len(),
                registry.process_count()
            ));
        }
        for process in registry.processes() {
            let p = process.id();
            for rid in (0u32..).take(registry.resource_count()).map(ResourceId::new) {
                let (held, allocated) = (process.held_units(rid), self.allocation(p, rid));
                if held != allocated {
                    return Err(format!(
                        "{p} {rid}: banker allocation {allocated} differs from holding {held}"
                    ));
                }
                let (declared, maximum) = (process.maximum_for(rid), cell(&self.maximum, p, rid));
                if declared != maximum {
                    return Err(format!(
                        "{p} {rid}: banker maximum {maximum} differs from declared {declared}"
                    ));
                }
            }
        }
        for (p, ((max, alloc), need)) in self
            .maximum
            .iter()
            .zip(&self.allocation)
            .zip(&self.need)
            .enumerate()
        {
            for (r, ((m, a), n)) in max.iter().zip(alloc).zip(need).enumerate() {
                if a + n != *m {
                    return Err(format!(
                        "P{p} R{r}: need {n} + allocation {a} != maximum {m}"
                    ));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn view(&self) -> BankerView {
        BankerView {
            available: by_resource(&self.available),
            allocation: by_process(&self.allocation),
            need: by_process(&self.need),
        }
    }
}

fn cell(matrix: &[Vec<u32>], process: ProcessId, resource: ResourceId) -> u32 {
    matrix
        .get(process.index())
        .and_then(|row| row.get(resource.index()))
        .copied()
        .unwrap_or(0)
}

fn fits(need: &[u32], work: &[u32]) -> bool {
    need.iter().zip(work).all(|(n, w)| n <= w)
}

fn by_resource(row: &[u32]) -> Units<ResourceId> {
    row.iter()
        .zip(0u32..)
        .map(|(units, r)| (ResourceId::new(r), *units))
        .collect()
}

fn by_process(matrix: &[Vec<u32>]) -> BTreeMap<ProcessId, Units<ResourceId>> {
    matrix
        .iter()
        .zip(0u32..)
        .map(|(row, p)| (ProcessId::new(p), by_resource(row)))
        .collect()
}
