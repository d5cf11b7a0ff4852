//! Integration tests for avoidance crate

use dlsim_avoidance::{BankerState, Evaluation};
use dlsim_resources::Registry;
use dlsim_types::{ProcessId, ResourceId};
use proptest::prelude::*;

fn pid(n: u32) -> ProcessId {
    ProcessId::new(n)
}

fn rid(n: u32) -> ResourceId {
    ResourceId::new(n)
}

/// Totals {10,5,7}; P0 holds {1,2,2} of max {7,5,3}, P1 holds {2,0,0} of max {3,2,2}
fn classic() -> (Registry, BankerState) {
    let maxima = vec![vec![7, 5, 3], vec![3, 2, 2]];
    let mut registry = Registry::new(&[10, 5, 7], &maxima);
    for (p, r, units) in [(0, 0, 1), (0, 1, 2), (0, 2, 2), (1, 0, 2)] {
        assert!(registry.allocate(pid(p), rid(r), units));
    }
    let banker = BankerState::from_registry(&registry);
    (registry, banker)
}

#[test]
fn test_classic_scenario_small_request_is_safe() {
    let (_, banker) = classic();
    assert_eq!(banker.available(rid(0)), 7);
    assert_eq!(banker.need(pid(1), rid(0)), 1);
    assert_eq!(banker.evaluate(pid(1), rid(0), 1), Evaluation::Safe);
}

#[test]
fn test_classic_scenario_large_request_exceeds_need() {
    let (_, banker) = classic();
    assert_eq!(
        banker.evaluate(pid(1), rid(0), 4),
        Evaluation::ExceedsNeed { need: 1 }
    );
}

#[test]
fn test_rebuild_raises_maximum_to_holdings() {
    let mut registry = Registry::new(&[4], &[vec![1]]);
    assert!(registry.allocate(pid(0), rid(0), 3));
    let banker = BankerState::from_registry(&registry);
    assert_eq!(banker.need(pid(0), rid(0)), 0);
    // Declared maximum is still 1 until the process record is raised too
    assert!(banker.verify(&registry).is_err());
    registry.process_mut(pid(0)).unwrap().raise_maximum(rid(0), 3);
    assert!(banker.verify(&registry).is_ok());
}

#[test]
fn test_verify_catches_allocation_drift() {
    let mut registry = Registry::new(&[2], &[vec![2], vec![2]]);
    assert!(registry.allocate(pid(0), rid(0), 1));
    let banker = BankerState::from_registry(&registry);
    assert!(banker.verify(&registry).is_ok());

    // Same units available, but moved to another process behind the banker's back
    assert_eq!(registry.release(pid(0), rid(0), None), 1);
    assert!(registry.allocate(pid(1), rid(0), 1));
    let err = banker.verify(&registry).unwrap_err();
    assert!(err.contains("allocation"), "{err}");
}

#[test]
fn test_view_keys_by_handle() {
    let (_, banker) = classic();
    let view = banker.view();
    assert_eq!(view.available[&rid(1)], 3);
    assert_eq!(view.need[&pid(0)][&rid(0)], 6);
}

#[test]
fn test_insufficient_before_safety() {
    let banker = BankerState::new(vec![1], vec![vec![3]]);
    assert_eq!(banker.evaluate(pid(0), rid(0), 2), Evaluation::Insufficient);
}

proptest! {
    #[test]
    fn prop_only_safe_grants_commit(ops in prop::collection::vec((0u32..3, 0u32..2, 1u32..3), 0..40)) {
        let maxima = vec![vec![3, 2], vec![2, 2], vec![3, 1]];
        let mut registry = Registry::new(&[4, 3], &maxima);
        let mut banker = BankerState::from_registry(&registry);
        for (p, r, units) in ops {
            if banker.evaluate(pid(p), rid(r), units) == Evaluation::Safe {
                prop_assert!(registry.allocate(pid(p), rid(r), units));
                banker.commit(pid(p), rid(r), units);
            } else if units == 1 {
                let freed = registry.release(pid(p), rid(r), Some(1));
                banker.release(pid(p), rid(r), freed);
            }
            prop_assert!(banker.verify(&registry).is_ok());
            prop_assert!(registry.verify().is_ok());
        }
    }
}
