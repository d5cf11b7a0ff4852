//! Integration tests for coordinator crate

use dlsim_config::Config;
use dlsim_coordinator::{Coordinator, SharedCoordinator, Topology};
use dlsim_errors::{ConfigError, UsageError};
use dlsim_events::{AllocationEvent, AppEvent, DeadlockEvent, GeneralEvent, SimulationEvent};
use dlsim_types::{DenialReason, Mode, ProcessId, ProcessState, RequestOutcome, ResourceId};

fn pid(n: u32) -> ProcessId {
    ProcessId::new(n)
}

fn rid(n: u32) -> ResourceId {
    ResourceId::new(n)
}

/// Totals {10,5,7}; P0 ends up holding {1,2,2}, P1 holding {2,0,0}
fn banker_classic() -> Coordinator {
    let topology = Topology::new(vec![10, 5, 7])
        .with_process(vec![7, 5, 3])
        .with_process(vec![3, 2, 2]);
    let mut c = Coordinator::builder()
        .with_mode(Mode::Avoidance)
        .load(&topology)
        .unwrap();
    for (p, r, units) in [(0, 0, 1), (0, 1, 2), (0, 2, 2), (1, 0, 2)] {
        assert_eq!(c.request(pid(p), rid(r), units), Ok(RequestOutcome::Granted));
    }
    c
}

/// P0 holds R0 and waits for R1; P1 holds R1 and waits for R0
fn crossed(mode: Mode) -> Coordinator {
    let topology = Topology::new(vec![1, 1])
        .with_process(vec![1, 1])
        .with_process(vec![1, 1]);
    let mut c = Coordinator::builder()
        .with_mode(mode)
        .load(&topology)
        .unwrap();
    assert_eq!(c.request(pid(0), rid(0), 1), Ok(RequestOutcome::Granted));
    assert_eq!(c.request(pid(1), rid(1), 1), Ok(RequestOutcome::Granted));
    assert_eq!(c.request(pid(0), rid(1), 1), Ok(RequestOutcome::Waiting));
    assert_eq!(c.request(pid(1), rid(0), 1), Ok(RequestOutcome::Waiting));
    c
}

#[test]
fn test_banker_small_request_granted() {
    let mut c = banker_classic();
    assert_eq!(c.request(pid(1), rid(0), 1), Ok(RequestOutcome::Granted));
    assert!(c.check_invariants().is_ok());
    let banker = c.snapshot().banker.unwrap();
    assert_eq!(banker.available[&rid(0)], 6);
    assert_eq!(banker.need[&pid(1)][&rid(0)], 0);
}

#[test]
fn test_banker_large_request_denied() {
    let mut c = banker_classic();
    assert_eq!(
        c.request(pid(1), rid(0), 4),
        Ok(RequestOutcome::Denied(DenialReason::ExceedsMaximumDemand {
            requested: 4,
            need: 1,
        }))
    );
    assert_eq!(
        c.registry().process(pid(1)).unwrap().state(),
        ProcessState::Ready
    );
    assert_eq!(c.counters().denials, 1);
    // exceeding the declared maximum is not an unsafe-state denial
    assert_eq!(c.counters().avoidances, 0);
}

#[test]
fn test_banker_unsafe_request_denied_without_side_effects() {
    let topology = Topology::new(vec![2])
        .with_process(vec![2])
        .with_process(vec![2]);
    let mut c = Coordinator::builder()
        .with_mode(Mode::Avoidance)
        .load(&topology)
        .unwrap();
    assert_eq!(c.request(pid(0), rid(0), 1), Ok(RequestOutcome::Granted));
    let before = c.snapshot();

    assert_eq!(
        c.request(pid(1), rid(0), 1),
        Ok(RequestOutcome::Denied(DenialReason::UnsafeState))
    );
    let after = c.snapshot();
    assert_eq!(before.resources, after.resources);
    assert_eq!(before.banker, after.banker);
    assert_eq!(after.counters.avoidances, 1);
}

#[test]
fn test_detection_finds_cycle_and_terminates_first_member() {
    let mut c = crossed(Mode::Detection);
    assert!(c.detect());

    let snap = c.snapshot();
    assert_eq!(snap.last_cycle, Some(vec![pid(0), pid(1)]));
    assert_eq!(snap.processes[&pid(0)].state, ProcessState::Terminated);
    assert!(snap.processes[&pid(0)].held.is_empty());
    assert!(snap.waiting_queue.iter().all(|w| w.process != pid(0)));
    assert!(!snap.resources[&rid(0)].allocated.contains_key(&pid(0)));
    assert_eq!(snap.counters.deadlocks, 1);
    assert_eq!(snap.counters.recoveries, 1);

    // P1's queued request for R0 is granted from the freed units
    assert_eq!(snap.processes[&pid(1)].state, ProcessState::Running);
    assert_eq!(snap.processes[&pid(1)].held[&rid(0)], 1);
    assert!(c.check_invariants().is_ok());
    assert!(!c.detect());
}

#[test]
fn test_lowest_holdings_policy() {
    let topology = Topology::new(vec![2, 1])
        .with_process(vec![2, 1])
        .with_process(vec![2, 1]);
    let mut c = Coordinator::builder()
        .with_victim_policy(dlsim_types::VictimPolicyKind::LowestHoldings)
        .load(&topology)
        .unwrap();
    c.request(pid(0), rid(0), 2).unwrap();
    c.request(pid(1), rid(1), 1).unwrap();
    c.request(pid(0), rid(1), 1).unwrap();
    c.request(pid(1), rid(0), 1).unwrap();

    assert!(c.detect());
    assert_eq!(
        c.registry().process(pid(1)).unwrap().state(),
        ProcessState::Terminated
    );
    assert_eq!(c.snapshot().victim_policy, "lowest_holdings");
}

#[test]
fn test_prevention_ordering() {
    let topology = Topology::new(vec![1, 1, 1])
        .with_random_processes(2);
    let mut c = Coordinator::builder()
        .with_mode(Mode::Prevention)
        .with_seed(9)
        .load(&topology)
        .unwrap();
    assert_eq!(c.request(pid(0), rid(1), 1), Ok(RequestOutcome::Granted));
    assert_eq!(
        c.request(pid(0), rid(0), 1),
        Ok(RequestOutcome::Denied(DenialReason::OrderingViolation {
            resource: rid(0),
            highest_held: rid(1),
        }))
    );
    assert_eq!(c.counters().preventions, 1);
    assert_eq!(
        c.registry().process(pid(0)).unwrap().state(),
        ProcessState::Ready
    );

    // R2 ranks above R1: granted when free, waiting when taken, never denied
    assert_eq!(c.request(pid(1), rid(2), 1), Ok(RequestOutcome::Granted));
    assert_eq!(c.request(pid(0), rid(2), 1), Ok(RequestOutcome::Waiting));
    assert!(c.check_invariants().is_ok());
}

#[test]
fn test_prevention_never_deadlocks_on_crossed_requests() {
    let topology = Topology::new(vec![1, 1])
        .with_process(vec![1, 1])
        .with_process(vec![1, 1]);
    let mut c = Coordinator::builder()
        .with_mode(Mode::Prevention)
        .load(&topology)
        .unwrap();
    c.request(pid(0), rid(0), 1).unwrap();
    c.request(pid(1), rid(1), 1).unwrap();
    assert_eq!(c.request(pid(0), rid(1), 1), Ok(RequestOutcome::Waiting));
    assert!(c.request(pid(1), rid(0), 1).unwrap().is_denied());
}

#[test]
fn test_release_not_held_is_idempotent() {
    let mut c = crossed(Mode::Detection);
    let before = c.snapshot().resources;
    assert_eq!(c.release(pid(0), rid(1), Some(1)), Ok(0));
    assert_eq!(c.release(pid(0), rid(1), None), Ok(0));
    assert_eq!(c.snapshot().resources, before);
    assert_eq!(c.counters().releases, 0);
    assert!(c.check_invariants().is_ok());
}

#[test]
fn test_terminated_process_cannot_request() {
    let mut c = crossed(Mode::Detection);
    c.detect();
    assert_eq!(
        c.request(pid(0), rid(0), 1),
        Err(UsageError::ProcessTerminated {
            process: "P0".to_string()
        })
    );
}

#[test]
fn test_switch_into_avoidance_rebuilds_from_pools() {
    let topology = Topology::new(vec![3])
        .with_process(vec![1])
        .with_process(vec![3]);
    let mut c = Coordinator::builder().load(&topology).unwrap();
    // Detection mode ignores declared maxima
    assert_eq!(c.request(pid(0), rid(0), 2), Ok(RequestOutcome::Granted));

    c.set_mode(Mode::Avoidance);
    let snap = c.snapshot();
    let banker = snap.banker.unwrap();
    assert_eq!(banker.available[&rid(0)], 1);
    assert_eq!(banker.allocation[&pid(0)][&rid(0)], 2);
    assert_eq!(banker.need[&pid(0)][&rid(0)], 0);
    assert_eq!(snap.processes[&pid(0)].maximum_demand[&rid(0)], 2);
    assert!(c.check_invariants().is_ok());

    assert_eq!(c.release(pid(0), rid(0), Some(1)), Ok(1));
    assert_eq!(c.snapshot().banker.unwrap().available[&rid(0)], 2);
    assert!(c.check_invariants().is_ok());
}

#[test]
fn test_switch_into_avoidance_denies_waiting_over_need() {
    let topology = Topology::new(vec![2])
        .with_process(vec![1])
        .with_process(vec![2]);
    let mut c = Coordinator::builder().load(&topology).unwrap();
    assert_eq!(c.request(pid(1), rid(0), 1), Ok(RequestOutcome::Granted));
    // Queued for more than its declared maximum
    assert_eq!(c.request(pid(0), rid(0), 2), Ok(RequestOutcome::Waiting));

    c.set_mode(Mode::Avoidance);
    let snap = c.snapshot();
    assert!(snap.waiting_queue.is_empty());
    assert_eq!(snap.processes[&pid(0)].state, ProcessState::Ready);
    assert_eq!(snap.processes[&pid(0)].waiting_for, None);
    assert_eq!(c.counters().denials, 1);
    assert!(c.check_invariants().is_ok());

    c.release(pid(1), rid(0), None).unwrap();
    assert_eq!(c.request(pid(0), rid(0), 1), Ok(RequestOutcome::Granted));
    assert!(c.check_invariants().is_ok());
}

#[test]
fn test_avoidance_waiting_entry_granted_once_safe() {
    let topology = Topology::new(vec![2])
        .with_process(vec![2])
        .with_process(vec![2]);
    let mut c = Coordinator::builder()
        .with_mode(Mode::Avoidance)
        .load(&topology)
        .unwrap();
    assert_eq!(c.request(pid(0), rid(0), 2), Ok(RequestOutcome::Granted));
    assert_eq!(c.request(pid(1), rid(0), 1), Ok(RequestOutcome::Waiting));

    // One unit free, but granting it would leave no completion order
    c.release(pid(0), rid(0), Some(1)).unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.processes[&pid(1)].state, ProcessState::Waiting);
    assert_eq!(snap.waiting_queue.len(), 1);
    assert!(c.check_invariants().is_ok());

    c.release(pid(0), rid(0), Some(1)).unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.processes[&pid(1)].state, ProcessState::Running);
    assert_eq!(snap.processes[&pid(1)].held[&rid(0)], 1);
    assert!(snap.waiting_queue.is_empty());
    assert!(c.check_invariants().is_ok());
}

#[test]
fn test_waiting_entries_granted_in_fifo_order() {
    let topology = Topology::new(vec![2])
        .with_process(vec![2])
        .with_process(vec![2])
        .with_process(vec![2]);
    let mut c = Coordinator::builder().load(&topology).unwrap();
    c.request(pid(0), rid(0), 2).unwrap();
    assert_eq!(c.request(pid(1), rid(0), 2), Ok(RequestOutcome::Waiting));
    assert_eq!(c.request(pid(2), rid(0), 1), Ok(RequestOutcome::Waiting));

    // One unit back: P1 still cannot fit but P2 behind it can
    c.release(pid(0), rid(0), Some(1)).unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.processes[&pid(2)].state, ProcessState::Running);
    assert_eq!(snap.waiting_queue.len(), 1);
    assert_eq!(snap.waiting_queue[0].process, pid(1));
}

#[test]
fn test_configure_clamps_counts_with_warning() {
    let (tx, mut rx) = dlsim_events::channel();
    let config = Config::default();
    let mut c = Coordinator::builder()
        .with_config(&config)
        .with_seed(5)
        .with_event_sender(tx)
        .build();
    c.configure(500, 0, 2..=4).unwrap();

    assert_eq!(c.registry().process_count(), 100);
    assert_eq!(c.registry().resource_count(), 1);

    let mut warnings = 0;
    while let Ok(message) = rx.try_recv() {
        if matches!(message.event, AppEvent::General(GeneralEvent::Warning { .. })) {
            warnings += 1;
        }
    }
    assert_eq!(warnings, 2);
}

#[test]
fn test_configure_rejects_empty_capacity_range() {
    let mut c = Coordinator::builder().build();
    #[allow(clippy::reversed_empty_ranges)]
    let range = 4..=2;
    assert!(c.configure(2, 2, range).is_err());
    assert!(c.configure(2, 2, 0..=2).is_err());
}

#[test]
fn test_load_rejects_maximum_above_capacity() {
    let topology = Topology::new(vec![2])
        .with_process(vec![5])
        .with_process(vec![1]);
    let result = Coordinator::builder()
        .with_mode(Mode::Avoidance)
        .load(&topology);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue { ref field, .. }) if field == "maxima[0][0]"
    ));
}

#[test]
fn test_same_seed_same_system() {
    let build = || {
        let mut c = Coordinator::builder().with_seed(77).build();
        c.configure(6, 4, 2..=4).unwrap();
        for _ in 0..25 {
            c.auto_step().unwrap();
        }
        c.snapshot()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_events_carry_step_correlation() {
    let (tx, mut rx) = dlsim_events::channel();
    let topology = Topology::new(vec![1]).with_process(vec![1]);
    let mut c = Coordinator::builder()
        .with_event_sender(tx)
        .load(&topology)
        .unwrap();
    c.request(pid(0), rid(0), 1).unwrap();

    let mut seen = Vec::new();
    while let Ok(message) = rx.try_recv() {
        seen.push(message);
    }
    let granted = seen
        .iter()
        .find(|m| matches!(m.event, AppEvent::Allocation(AllocationEvent::Granted { .. })))
        .unwrap();
    assert_eq!(granted.meta.correlation_id.as_deref(), Some("step-1"));
    assert_eq!(
        granted.meta.labels.get("mode").map(String::as_str),
        Some("detection")
    );
    assert!(matches!(
        seen.last().unwrap().event,
        AppEvent::Simulation(SimulationEvent::StateChanged { step: 1 })
    ));
}

#[test]
fn test_detection_events() {
    let (tx, mut rx) = dlsim_events::channel();
    let topology = Topology::new(vec![1, 1])
        .with_process(vec![1, 1])
        .with_process(vec![1, 1]);
    let mut c = Coordinator::builder()
        .with_event_sender(tx)
        .load(&topology)
        .unwrap();
    c.request(pid(0), rid(0), 1).unwrap();
    c.request(pid(1), rid(1), 1).unwrap();
    c.request(pid(0), rid(1), 1).unwrap();
    c.request(pid(1), rid(0), 1).unwrap();
    assert!(c.detect());

    let mut victim = None;
    while let Ok(message) = rx.try_recv() {
        if let AppEvent::Deadlock(DeadlockEvent::VictimTerminated { victim: v, freed, .. }) =
            message.event
        {
            assert_eq!(freed, vec![(rid(0), 1)]);
            victim = Some(v);
        }
    }
    assert_eq!(victim, Some(pid(0)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_coordinator_serializes_callers() {
    let topology = Topology::new(vec![3, 2, 2]).with_random_processes(6);
    let coordinator = Coordinator::builder()
        .with_seed(11)
        .load(&topology)
        .unwrap();
    let shared = SharedCoordinator::new(coordinator);

    let mut handles = Vec::new();
    for p in 0..6u32 {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..20u32 {
                let resource = rid((p + round) % 3);
                let _ = shared.request(pid(p), resource, 1).await;
                let _ = shared.release(pid(p), resource, Some(1)).await;
                shared.detect().await;
                assert!(shared.check_invariants().await.is_ok());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snap = shared.snapshot().await;
    for resource in snap.resources.values() {
        let allocated: u32 = resource.allocated.values().sum();
        assert_eq!(resource.available + allocated, resource.total);
    }
}
