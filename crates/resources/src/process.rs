//! Per-process lifecycle and holdings

use dlsim_types::{ProcessId, ProcessState, ProcessView, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One simulated process
///
/// `held` mirrors the entries keyed by this process across all resource
/// pools; [`crate::Registry`] keeps the two in lock-step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    id: ProcessId,
    state: ProcessState,
    held: BTreeMap<ResourceId, u32>,
    /// First-acquired order of currently held resources
    holding: Vec<ResourceId>,
    waiting_for: Option<(ResourceId, u32)>,
    requesting: Option<ResourceId>,
    maximum_demand: BTreeMap<ResourceId, u32>,
}

impl Process {
    #[must_use]
    pub fn new(id: ProcessId, maximum_demand: BTreeMap<ResourceId, u32>) -> Self {
        Self {
            id,
            state: ProcessState::Ready,
            held: BTreeMap::new(),
            holding: Vec::new(),
            waiting_for: None,
            requesting: None,
            maximum_demand,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    #[must_use]
    pub fn waiting_for(&self) -> Option<(ResourceId, u32)> {
        self.waiting_for
    }

    #[must_use]
    pub fn held_units(&self, resource: ResourceId) -> u32 {
        self.held.get(&resource).copied().unwrap_or(0)
    }

    /// Held resources with their unit counts, in id order
    pub fn held(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.held.iter().map(|(rid, units)| (*rid, *units))
    }

    #[must_use]
    pub fn holds_nothing(&self) -> bool {
        self.held.is_empty()
    }

    /// Sum of units over every held resource
    #[must_use]
    pub fn total_held(&self) -> u64 {
        self.held.values().map(|u| u64::from(*u)).sum()
    }

    #[must_use]
    pub fn maximum_demand(&self) -> &BTreeMap<ResourceId, u32> {
        &self.maximum_demand
    }

    #[must_use]
    pub fn maximum_for(&self, resource: ResourceId) -> u32 {
        self.maximum_demand.get(&resource).copied().unwrap_or(0)
    }

    /// Raise the recorded ceiling so it is never below current holdings
    pub fn raise_maximum(&mut self, resource: ResourceId, units: u32) {
        let entry = self.maximum_demand.entry(resource).or_insert(0);
        *entry = (*entry).max(units);
    }

    /// Mark an outstanding request; the process blocks until it is resolved
    pub fn begin_request(&mut self, resource: ResourceId, units: u32) {
        self.waiting_for = Some((resource, units));
        self.requesting = Some(resource);
        self.state = ProcessState::Waiting;
    }

    /// Record units handed over by a pool and resume running
    pub fn grant(&mut self, resource: ResourceId, units: u32) {
        *self.held.entry(resource).or_insert(0) += units;
        if !self.holding.contains(&resource) {
            self.holding.push(resource);
        }
        self.waiting_for = None;
        self.requesting = None;
        self.state = ProcessState::Running;
    }

    /// Request refused; back to ready with nothing outstanding
    pub fn deny(&mut self) {
        self.waiting_for = None;
        self.requesting = None;
        self.state = ProcessState::Ready;
    }

    /// Trim bookkeeping after a pool released `units` of `resource`
    pub fn record_release(&mut self, resource: ResourceId, units: u32) {
        let Some(held) = self.held.get_mut(&resource) else {
            return;
        };
        *held = held.saturating_sub(units);
        if *held == 0 {
            self.held.remove(&resource);
            self.holding.retain(|r| *r != resource);
        }
    }

    /// Final state for a deadlock victim
    pub fn terminate(&mut self) {
        self.waiting_for = None;
        self.requesting = None;
        self.state = ProcessState::Terminated;
    }

    #[must_use]
    pub fn view(&self, include_maximum: bool) -> ProcessView {
        ProcessView {
            state: self.state,
            held: self.held.clone(),
            holding: self.holding.clone(),
            waiting_for: self.waiting_for,
            requesting: self.requesting,
            maximum_demand: if include_maximum {
                self.maximum_demand.clone()
            } else {
                BTreeMap::new()
            },
        }
    }
}
