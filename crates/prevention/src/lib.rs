#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock prevention by static resource ordering
//!
//! Each resource gets a rank when the system is set up. A process may only
//! request a resource that ranks strictly above everything it currently
//! holds, which rules out circular wait.

use dlsim_resources::Process;
use dlsim_types::{DenialReason, ResourceId};

/// Total order over resources, fixed for the lifetime of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOrder {
    ranks: Vec<u32>,
}

impl ResourceOrder {
    /// Rank resources `1..=count` in creation order
    #[must_use]
    pub fn sequential(count: usize) -> Self {
        Self {
            ranks: (1..).take(count).collect(),
        }
    }

    /// Rank of `resource`, or 0 for a handle outside the order
    #[must_use]
    pub fn rank(&self, resource: ResourceId) -> u32 {
        self.ranks.get(resource.index()).copied().unwrap_or(0)
    }

    /// Highest-ranked resource among current holdings
    pub fn highest_held(&self, process: &Process) -> Option<ResourceId> {
        process
            .held()
            .map(|(rid, _)| rid)
            .max_by_key(|rid| self.rank(*rid))
    }

    /// Ordering rule: permitted when the process holds nothing or the
    /// resource outranks every held resource
    ///
    /// # Errors
    ///
    /// Returns [`DenialReason::OrderingViolation`] naming the held resource
    /// that blocks the request.
    pub fn check_rule(&self, process: &Process, resource: ResourceId) -> Result<(), DenialReason> {
        match self.highest_held(process) {
            Some(highest) if self.rank(resource) <= self.rank(highest) => {
                Err(DenialReason::OrderingViolation {
                    resource,
                    highest_held: highest,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlsim_types::ProcessId;
    use std::collections::BTreeMap;

    fn rid(n: u32) -> ResourceId {
        ResourceId::new(n)
    }

    #[test]
    fn test_sequential_ranks() {
        let order = ResourceOrder::sequential(3);
        assert_eq!(order.rank(rid(0)), 1);
        assert_eq!(order.rank(rid(2)), 3);
        assert_eq!(order.rank(rid(7)), 0);
    }

    #[test]
    fn test_empty_holdings_permit_anything() {
        let order = ResourceOrder::sequential(3);
        let p = Process::new(ProcessId::new(0), BTreeMap::new());
        assert!(order.check_rule(&p, rid(0)).is_ok());
        assert!(order.check_rule(&p, rid(2)).is_ok());
    }

    #[test]
    fn test_same_resource_is_not_above_itself() {
        let order = ResourceOrder::sequential(3);
        let mut p = Process::new(ProcessId::new(0), BTreeMap::new());
        p.grant(rid(1), 1);
        assert_eq!(
            order.check_rule(&p, rid(1)),
            Err(DenialReason::OrderingViolation {
                resource: rid(1),
                highest_held: rid(1),
            })
        );
    }
}
