//! Victim selection for deadlock recovery

use dlsim_resources::{Process, Registry};
use dlsim_types::{ProcessId, VictimPolicyKind};
use std::fmt;

/// Chooses which process in a detected cycle is terminated
pub trait VictimPolicy: fmt::Debug + Send + Sync {
    /// Stable name shown in snapshots and events
    fn name(&self) -> &'static str;

    /// Pick a member of `cycle`; `None` only for an empty cycle
    fn select(&self, cycle: &[ProcessId], registry: &Registry) -> Option<ProcessId>;
}

/// The first process of the reported cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInCycle;

impl VictimPolicy for FirstInCycle {
    fn name(&self) -> &'static str {
        VictimPolicyKind::FirstInCycle.as_str()
    }

    fn select(&self, cycle: &[ProcessId], _registry: &Registry) -> Option<ProcessId> {
        cycle.first().copied()
    }
}

/// The process holding the fewest units; ties go to the earliest in the cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestHoldings;

impl VictimPolicy for LowestHoldings {
    fn name(&self) -> &'static str {
        VictimPolicyKind::LowestHoldings.as_str()
    }

    fn select(&self, cycle: &[ProcessId], registry: &Registry) -> Option<ProcessId> {
        cycle
            .iter()
            .enumerate()
            .min_by_key(|(pos, pid)| {
                let held = registry.process(**pid).map_or(0, Process::total_held);
                (held, *pos)
            })
            .map(|(_, pid)| *pid)
    }
}

#[must_use]
pub fn policy_for(kind: VictimPolicyKind) -> Box<dyn VictimPolicy> {
    match kind {
        VictimPolicyKind::FirstInCycle => Box::new(FirstInCycle),
        VictimPolicyKind::LowestHoldings => Box::new(LowestHoldings),
    }
}
