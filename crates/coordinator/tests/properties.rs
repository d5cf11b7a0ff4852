//! Property tests: random request/release/detect sequences in every mode

use dlsim_coordinator::{Coordinator, Topology};
use dlsim_types::{Mode, ProcessId, ProcessState, RequestOutcome, ResourceId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Request(u32, u32, u32),
    Release(u32, u32, Option<u32>),
    Detect,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0u32..4, 0u32..3, 1u32..4).prop_map(|(p, r, u)| Op::Request(p, r, u)),
        3 => (0u32..4, 0u32..3, prop::option::of(1u32..3)).prop_map(|(p, r, u)| Op::Release(p, r, u)),
        1 => Just(Op::Detect),
    ]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Detection),
        Just(Mode::Prevention),
        Just(Mode::Avoidance),
    ]
}

fn system(mode: Mode, seed: u64) -> Coordinator {
    let topology = Topology::new(vec![3, 2, 4]).with_random_processes(4);
    Coordinator::builder()
        .with_mode(mode)
        .with_seed(seed)
        .load(&topology)
        .unwrap()
}

proptest! {
    #[test]
    fn prop_invariants_hold(mode in mode(), seed in any::<u64>(), ops in prop::collection::vec(op(), 1..80)) {
        let mut c = system(mode, seed);

        for op in ops {
            match op {
                Op::Request(p, r, units) => {
                    let (pid, rid) = (ProcessId::new(p), ResourceId::new(r));
                    let highest_before = c
                        .resource_order()
                        .highest_held(c.registry().process(pid).unwrap())
                        .map(|h| c.resource_order().rank(h));
                    let outcome = c.request(pid, rid, units);

                    if mode == Mode::Prevention && outcome == Ok(RequestOutcome::Granted) {
                        if let Some(rank) = highest_before {
                            prop_assert!(c.resource_order().rank(rid) > rank);
                        }
                    }
                }
                Op::Release(p, r, units) => {
                    let released = c
                        .release(ProcessId::new(p), ResourceId::new(r), units)
                        .unwrap();
                    if let Some(asked) = units {
                        prop_assert!(released <= asked);
                    }
                }
                Op::Detect => {
                    if c.detect() {
                        let cycle = c.snapshot().last_cycle.unwrap();
                        let victim = cycle[0];
                        let snap = c.snapshot();
                        let view = &snap.processes[&victim];
                        prop_assert_eq!(view.state, ProcessState::Terminated);
                        prop_assert!(view.held.is_empty());
                        prop_assert!(snap.waiting_queue.iter().all(|w| w.process != victim));
                        for resource in snap.resources.values() {
                            prop_assert!(!resource.allocated.contains_key(&victim));
                        }
                    }
                }
            }

            prop_assert!(c.check_invariants().is_ok(), "{:?}", c.check_invariants());
            if mode == Mode::Avoidance {
                // A zero-unit probe runs the safety search on the live state
                prop_assert!(c.banker().is_safe(ProcessId::new(0), ResourceId::new(0), 0));
            }
        }
    }
}
