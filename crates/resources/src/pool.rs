//! Capacity tracking for one resource type
//!
//! A [`Resource`] owns the invariant
//! `available_units + sum(allocated) == total_units`. Entries in
//! `allocated` are always non-zero; a process that drops to zero units is
//! removed from the map.

use dlsim_types::{ProcessId, ResourceId, ResourceView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resource type with a fixed number of identical units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    total_units: u32,
    available_units: u32,
    allocated: BTreeMap<ProcessId, u32>,
}

impl Resource {
    /// Create a pool with every unit available
    #[must_use]
    pub fn new(id: ResourceId, total_units: u32) -> Self {
        Self {
            id,
            total_units,
            available_units: total_units,
            allocated: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    #[must_use]
    pub fn available_units(&self) -> u32 {
        self.available_units
    }

    /// True iff `units` fit in what is currently available
    #[must_use]
    pub fn can_allocate(&self, units: u32) -> bool {
        units <= self.available_units
    }

    /// Move `units` from the pool to `process`
    ///
    /// Returns `false` and changes nothing when capacity is short or
    /// `units` is 0. This is a capacity gate, not an error: callers check
    /// [`Resource::can_allocate`] first and queue the request otherwise.
    pub fn allocate(&mut self, process: ProcessId, units: u32) -> bool {
        if units == 0 || !self.can_allocate(units) {
            return false;
        }
        self.available_units -= units;
        *self.allocated.entry(process).or_insert(0) += units;
        true
    }

    /// Return up to `units` (or everything when `None`) held by `process`
    ///
    /// The amount is clipped to what the process actually holds. Releasing
    /// for a process that holds nothing is a no-op returning 0.
    pub fn release(&mut self, process: ProcessId, units: Option<u32>) -> u32 {
        let Some(held) = self.allocated.get_mut(&process) else {
            return 0;
        };
        let actual = units.map_or(*held, |requested| requested.min(*held));
        *held -= actual;
        if *held == 0 {
            self.allocated.remove(&process);
        }
        self.available_units += actual;
        actual
    }

    /// Units currently held by `process`
    #[must_use]
    pub fn allocated_to(&self, process: ProcessId) -> u32 {
        self.allocated.get(&process).copied().unwrap_or(0)
    }

    /// Processes holding a non-zero amount, in id order
    pub fn holders(&self) -> impl Iterator<Item = (ProcessId, u32)> + '_ {
        self.allocated.iter().map(|(pid, units)| (*pid, *units))
    }

    /// Whether available plus allocated units add up to the total
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        let allocated: u64 = self.allocated.values().map(|u| u64::from(*u)).sum();
        u64::from(self.available_units) + allocated == u64::from(self.total_units)
            && self.allocated.values().all(|u| *u > 0)
    }

    #[must_use]
    pub fn view(&self) -> ResourceView {
        ResourceView {
            total: self.total_units,
            available: self.available_units,
            allocated: self.allocated.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u32) -> ProcessId {
        ProcessId::new(n)
    }

    #[test]
    fn test_allocate_within_capacity() {
        let mut r = Resource::new(ResourceId::new(0), 3);
        assert!(r.allocate(pid(0), 2));
        assert!(r.allocate(pid(0), 1));
        assert_eq!(r.available_units(), 0);
        assert_eq!(r.allocated_to(pid(0)), 3);
        assert!(r.is_conserved());
    }

    #[test]
    fn test_allocate_over_capacity_changes_nothing() {
        let mut r = Resource::new(ResourceId::new(0), 2);
        assert!(!r.allocate(pid(1), 3));
        assert_eq!(r.available_units(), 2);
        assert_eq!(r.holders().count(), 0);
    }

    #[test]
    fn test_allocate_zero_stores_nothing() {
        let mut r = Resource::new(ResourceId::new(0), 2);
        assert!(!r.allocate(pid(0), 0));
        assert_eq!(r.holders().count(), 0);
        assert_eq!(r.available_units(), 2);
    }

    #[test]
    fn test_release_is_clipped_and_removes_empty_entries() {
        let mut r = Resource::new(ResourceId::new(0), 4);
        r.allocate(pid(0), 2);
        assert_eq!(r.release(pid(0), Some(5)), 2);
        assert_eq!(r.allocated_to(pid(0)), 0);
        assert_eq!(r.holders().count(), 0);
        assert_eq!(r.available_units(), 4);
    }

    #[test]
    fn test_release_all() {
        let mut r = Resource::new(ResourceId::new(0), 4);
        r.allocate(pid(2), 3);
        assert_eq!(r.release(pid(2), None), 3);
        assert!(r.is_conserved());
    }

    #[test]
    fn test_release_unknown_process_is_noop() {
        let mut r = Resource::new(ResourceId::new(0), 4);
        r.allocate(pid(0), 1);
        assert_eq!(r.release(pid(9), Some(1)), 0);
        assert_eq!(r.available_units(), 3);
        assert!(r.is_conserved());
    }
}
