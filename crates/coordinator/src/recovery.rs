//! Deadlock detection and victim recovery

use crate::Coordinator;
use dlsim_detection::WaitForGraph;
use dlsim_events::{AllocationEvent, DeadlockEvent, EventEmitter};
use dlsim_types::{Mode, ProcessId};

impl Coordinator {
    /// Search the wait-for graph for a cycle and recover from it
    ///
    /// Only runs in detection mode; returns whether a deadlock was found.
    /// Detection never runs implicitly on request, the driver decides when.
    pub fn detect(&mut self) -> bool {
        if self.mode != Mode::Detection {
            return false;
        }

        let graph = WaitForGraph::build(
            &self.registry,
            self.waiting.iter().map(|e| (e.process, e.resource)),
        );
        let cycle = graph.find_cycle();
        self.emit_deadlock(DeadlockEvent::DetectionRun {
            edges: graph.edge_count(),
            waiting: graph.waiting_count(),
            deadlocked: cycle.is_some(),
        });

        let Some(cycle) = cycle else {
            return false;
        };
        self.counters.deadlocks += 1;
        self.emit_deadlock(DeadlockEvent::CycleDetected {
            cycle: cycle.clone(),
        });
        self.last_cycle = Some(cycle.clone());
        self.recover(&cycle);
        true
    }

    /// Terminate one process of `cycle` chosen by the victim policy
    ///
    /// The victim gives back everything it holds, loses its waiting entries
    /// and is never scheduled again. Returns the victim, or `None` if the
    /// cycle names nobody who can still be terminated.
    pub fn recover(&mut self, cycle: &[ProcessId]) -> Option<ProcessId> {
        let victim = self.policy.select(cycle, &self.registry)?;
        if self.registry.process(victim).ok()?.is_terminated() {
            return None;
        }

        let freed = self.registry.release_all(victim);
        if self.mode == Mode::Avoidance {
            for (resource, units) in &freed {
                self.banker.release(victim, *resource, *units);
            }
        }
        self.banker.retire(victim);
        if let Ok(owner) = self.registry.process_mut(victim) {
            owner.terminate();
        }

        let dropped = self.waiting.purge(victim);
        if dropped > 0 {
            self.emit_allocation(AllocationEvent::WaitingDropped {
                process: victim,
                entries: dropped,
            });
        }

        self.counters.recoveries += 1;
        self.emit_deadlock(DeadlockEvent::VictimTerminated {
            victim,
            policy: self.policy.name().to_string(),
            freed,
        });

        self.rescan_waiting();
        self.emit_state_changed(self.step);
        Some(victim)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Coordinator, Topology};
    use dlsim_types::{Mode, ProcessId, ProcessState, ResourceId};

    #[test]
    fn test_detect_is_noop_outside_detection_mode() {
        let topology = Topology::new(vec![1]).with_process(vec![1]);
        let mut c = Coordinator::builder()
            .with_mode(Mode::Prevention)
            .load(&topology)
            .unwrap();
        assert!(!c.detect());
        assert_eq!(c.counters().deadlocks, 0);
    }

    #[test]
    fn test_recover_twice_is_noop() {
        let topology = Topology::new(vec![1]).with_process(vec![1]);
        let mut c = Coordinator::builder().load(&topology).unwrap();
        let p0 = ProcessId::new(0);
        c.request(p0, ResourceId::new(0), 1).unwrap();

        assert_eq!(c.recover(&[p0]), Some(p0));
        assert_eq!(c.recover(&[p0]), None);
        assert_eq!(c.counters().recoveries, 1);
        assert_eq!(
            c.registry().process(p0).unwrap().state(),
            ProcessState::Terminated
        );
    }
}
