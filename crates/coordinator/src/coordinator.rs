//! Request/release dispatch and the waiting-queue rescan

use crate::queue::{WaitingQueue, WaitingRequest};
use crate::topology::Topology;
use dlsim_avoidance::{BankerState, Evaluation};
use dlsim_config::{clamp_entities, AutopilotConfig, Config};
use dlsim_detection::{policy_for, VictimPolicy};
use dlsim_errors::{ConfigError, SimulationError, UsageError};
use dlsim_events::{
    AllocationEvent, AppEvent, EventEmitter, EventSender, FailureContext, ModeEvent,
};
use dlsim_prevention::ResourceOrder;
use dlsim_resources::{Process, Registry};
use dlsim_types::{
    Counters, DenialReason, Mode, ProcessId, ProcessState, RequestOutcome, ResourceId, Snapshot,
    VictimPolicyKind,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, VecDeque};
use std::ops::RangeInclusive;

/// Owner of every registry, the waiting queue and the active discipline
///
/// All mutation goes through `&mut self`, so one call is applied in full
/// before the next begins. Use [`crate::SharedCoordinator`] to hand the
/// engine to several async drivers.
#[derive(Debug)]
pub struct Coordinator {
    pub(crate) registry: Registry,
    pub(crate) order: ResourceOrder,
    /// Consulted only in avoidance mode; stale otherwise
    pub(crate) banker: BankerState,
    pub(crate) waiting: WaitingQueue,
    pub(crate) mode: Mode,
    pub(crate) policy: Box<dyn VictimPolicy>,
    pub(crate) counters: Counters,
    pub(crate) step: u64,
    pub(crate) last_cycle: Option<Vec<ProcessId>>,
    pub(crate) autopilot: AutopilotConfig,
    pub(crate) rng: StdRng,
    tx: Option<EventSender>,
}

/// Builder for [`Coordinator`]
#[derive(Debug, Default)]
pub struct CoordinatorBuilder {
    mode: Mode,
    victim_policy: VictimPolicyKind,
    autopilot: AutopilotConfig,
    seed: Option<u64>,
    event_sender: Option<EventSender>,
}

impl CoordinatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take mode, victim policy, seed and autopilot settings from `config`
    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.mode = config.simulation.mode;
        self.victim_policy = config.simulation.victim_policy;
        self.seed = config.simulation.seed;
        self.autopilot = config.autopilot.clone();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_victim_policy(mut self, kind: VictimPolicyKind) -> Self {
        self.victim_policy = kind;
        self
    }

    #[must_use]
    pub fn with_autopilot(mut self, autopilot: AutopilotConfig) -> Self {
        self.autopilot = autopilot;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Build an empty coordinator; call [`Coordinator::configure`] or
    /// [`Coordinator::load`] before issuing requests
    #[must_use]
    pub fn build(self) -> Coordinator {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Coordinator {
            registry: Registry::default(),
            order: ResourceOrder::sequential(0),
            banker: BankerState::default(),
            waiting: WaitingQueue::default(),
            mode: self.mode,
            policy: policy_for(self.victim_policy),
            counters: Counters::default(),
            step: 0,
            last_cycle: None,
            autopilot: self.autopilot,
            rng,
            tx: self.event_sender,
        }
    }

    /// Build and load an explicit topology
    ///
    /// # Errors
    ///
    /// Returns an error if the topology is malformed.
    pub fn load(self, topology: &Topology) -> Result<Coordinator, ConfigError> {
        let mut coordinator = self.build();
        coordinator.load(topology)?;
        Ok(coordinator)
    }
}

impl EventEmitter for Coordinator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }

    fn correlation_id(&self) -> Option<String> {
        Some(format!("step-{}", self.step))
    }

    fn event_labels(&self) -> Vec<(&'static str, String)> {
        vec![("mode", self.mode.to_string())]
    }
}

impl Coordinator {
    #[must_use]
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Populate a random system
    ///
    /// Counts are clamped to [1, 100] with a warning event; capacities are
    /// drawn from `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty or zero-based
    /// capacity range.
    pub fn configure(
        &mut self,
        processes: usize,
        resources: usize,
        capacity: RangeInclusive<u32>,
    ) -> Result<(), ConfigError> {
        if *capacity.start() == 0 || capacity.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "capacity".to_string(),
                value: format!("{}..={}", capacity.start(), capacity.end()),
            });
        }
        let clamped_processes = clamp_entities(processes);
        let clamped_resources = clamp_entities(resources);
        if clamped_processes != processes {
            self.emit_warning_with_context(
                format!("process count {processes} clamped to {clamped_processes}"),
                "supported range is 1-100",
            );
        }
        if clamped_resources != resources {
            self.emit_warning_with_context(
                format!("resource count {resources} clamped to {clamped_resources}"),
                "supported range is 1-100",
            );
        }
        let topology = Topology::random(
            clamped_processes,
            clamped_resources,
            &capacity,
            &mut self.rng,
        );
        self.load(&topology)
    }

    /// Replace the whole system with `topology`
    ///
    /// Counters, the waiting queue and the step counter start over; the
    /// current mode and victim policy are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology is malformed.
    pub fn load(&mut self, topology: &Topology) -> Result<(), ConfigError> {
        topology.validate()?;
        let maxima = topology.resolve_maxima(&mut self.rng);
        self.registry = Registry::new(&topology.capacities, &maxima);
        self.order = ResourceOrder::sequential(topology.capacities.len());
        self.banker = BankerState::from_registry(&self.registry);
        self.waiting.clear();
        self.counters = Counters::default();
        self.step = 0;
        self.last_cycle = None;

        self.emit(AppEvent::Mode(ModeEvent::Configured {
            processes: self.registry.process_count(),
            resources: self.registry.resource_count(),
            mode: self.mode,
        }));
        Ok(())
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn banker(&self) -> &BankerState {
        &self.banker
    }

    #[must_use]
    pub fn resource_order(&self) -> &ResourceOrder {
        &self.order
    }

    pub fn waiting(&self) -> impl Iterator<Item = &WaitingRequest> {
        self.waiting.iter()
    }

    #[must_use]
    pub fn victim_policy(&self) -> &dyn VictimPolicy {
        self.policy.as_ref()
    }

    /// Ask for `units` of `resource` on behalf of `process`
    ///
    /// Malformed calls are rejected before anything changes. Otherwise the
    /// active discipline decides between granting, queueing and denying.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for an unknown handle, a zero unit count, a
    /// terminated process, or a process that already has a request waiting.
    pub fn request(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> Result<RequestOutcome, UsageError> {
        if let Err(err) = self.validate_request(process, resource, units) {
            self.emit_allocation(AllocationEvent::Rejected {
                operation: format!("request {process} {resource} {units}"),
                failure: FailureContext::from_error(&err),
            });
            return Err(err);
        }

        self.counters.requests += 1;
        self.step += 1;
        self.emit_allocation(AllocationEvent::Requested {
            process,
            resource,
            units,
        });
        self.registry.process_mut(process)?.begin_request(resource, units);

        let outcome = match self.mode {
            Mode::Detection => self.request_direct(process, resource, units),
            Mode::Prevention => self.request_ordered(process, resource, units)?,
            Mode::Avoidance => self.request_banker(process, resource, units),
        };

        match outcome {
            RequestOutcome::Granted => {
                self.counters.grants += 1;
                self.emit_allocation(AllocationEvent::Granted {
                    process,
                    resource,
                    units,
                });
                self.rescan_waiting();
            }
            RequestOutcome::Waiting => {
                self.counters.waits += 1;
                self.waiting.push(WaitingRequest {
                    process,
                    resource,
                    units,
                });
                self.emit_allocation(AllocationEvent::Queued {
                    process,
                    resource,
                    units,
                    queue_len: self.waiting.len(),
                });
            }
            RequestOutcome::Denied(reason) => {
                self.counters.denials += 1;
                self.registry.process_mut(process)?.deny();
                self.emit_allocation(AllocationEvent::Denied {
                    process,
                    resource,
                    units,
                    reason,
                });
            }
        }

        self.emit_state_changed(self.step);
        Ok(outcome)
    }

    fn validate_request(
        &self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> Result<(), UsageError> {
        self.registry.resource(resource)?;
        let owner = self.registry.process(process)?;
        if units < 1 {
            return Err(UsageError::InvalidUnits { units });
        }
        match owner.state() {
            ProcessState::Terminated => Err(UsageError::ProcessTerminated {
                process: process.to_string(),
            }),
            ProcessState::Waiting => Err(UsageError::ProcessBlocked {
                process: process.to_string(),
            }),
            ProcessState::Ready | ProcessState::Running => Ok(()),
        }
    }

    /// Detection mode: grant on capacity, queue otherwise
    fn request_direct(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> RequestOutcome {
        if self.registry.allocate(process, resource, units) {
            RequestOutcome::Granted
        } else {
            RequestOutcome::Waiting
        }
    }

    /// Prevention mode: enforce the ordering rule, then behave like detection
    fn request_ordered(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> Result<RequestOutcome, UsageError> {
        let owner = self.registry.process(process)?;
        if let Err(reason) = self.order.check_rule(owner, resource) {
            self.counters.preventions += 1;
            return Ok(RequestOutcome::Denied(reason));
        }
        Ok(self.request_direct(process, resource, units))
    }

    /// Avoidance mode: Banker evaluation, committing only safe grants
    fn request_banker(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    ) -> RequestOutcome {
        match self.banker.evaluate(process, resource, units) {
            Evaluation::ExceedsNeed { need } => {
                RequestOutcome::Denied(DenialReason::ExceedsMaximumDemand {
                    requested: units,
                    need,
                })
            }
            Evaluation::Insufficient => RequestOutcome::Waiting,
            Evaluation::Unsafe => {
                self.counters.avoidances += 1;
                RequestOutcome::Denied(DenialReason::UnsafeState)
            }
            Evaluation::Safe => {
                if self.registry.allocate(process, resource, units) {
                    self.banker.commit(process, resource, units);
                    RequestOutcome::Granted
                } else {
                    RequestOutcome::Waiting
                }
            }
        }
    }

    /// Return units of `resource` held by `process`
    ///
    /// `None` releases everything held. The amount is clipped to the
    /// holding, so releasing something not held returns 0.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for an unknown handle or `Some(0)` units.
    pub fn release(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        units: Option<u32>,
    ) -> Result<u32, UsageError> {
        let validated = self
            .registry
            .resource(resource)
            .and_then(|_| self.registry.process(process))
            .and_then(|_| match units {
                Some(0) => Err(UsageError::InvalidUnits { units: 0 }),
                _ => Ok(()),
            });
        if let Err(err) = validated {
            self.emit_allocation(AllocationEvent::Rejected {
                operation: format!("release {process} {resource}"),
                failure: FailureContext::from_error(&err),
            });
            return Err(err);
        }

        let released = self.registry.release(process, resource, units);
        if released > 0 {
            self.counters.releases += 1;
            if self.mode == Mode::Avoidance {
                self.banker.release(process, resource, released);
            }
        }
        self.emit_allocation(AllocationEvent::Released {
            process,
            resource,
            requested: units,
            released,
        });

        self.rescan_waiting();
        self.emit_state_changed(self.step);
        Ok(released)
    }

    /// Switch the active discipline
    ///
    /// Entering avoidance rebuilds the Banker matrices from the live pools.
    /// A maximum below a current holding is raised to that holding first.
    /// Queued requests larger than the rebuilt need are denied, since no
    /// later release could make them grantable.
    pub fn set_mode(&mut self, mode: Mode) {
        let previous = self.mode;
        self.mode = mode;
        if previous != mode {
            self.emit(AppEvent::Mode(ModeEvent::Switched {
                from: previous,
                to: mode,
            }));
        }
        if mode == Mode::Avoidance {
            self.reinitialize_banker();
            self.deny_waiting_over_need();
        }
        self.rescan_waiting();
        self.emit_state_changed(self.step);
    }

    fn reinitialize_banker(&mut self) {
        let holdings: Vec<(ProcessId, Vec<(ResourceId, u32)>)> = self
            .registry
            .processes()
            .map(|p| (p.id(), p.held().collect()))
            .collect();
        for (pid, held) in holdings {
            if let Ok(owner) = self.registry.process_mut(pid) {
                for (rid, units) in held {
                    owner.raise_maximum(rid, units);
                }
            }
        }
        self.banker = BankerState::from_registry(&self.registry);
        self.emit(AppEvent::Mode(ModeEvent::BankerReinitialized {
            processes: self.registry.process_count(),
            resources: self.registry.resource_count(),
        }));
    }

    fn deny_waiting_over_need(&mut self) {
        let mut remaining = VecDeque::new();
        for entry in self.waiting.take() {
            let need = self.banker.need(entry.process, entry.resource);
            if entry.units <= need {
                remaining.push_back(entry);
                continue;
            }
            let reason = DenialReason::ExceedsMaximumDemand {
                requested: entry.units,
                need,
            };
            if let Ok(owner) = self.registry.process_mut(entry.process) {
                owner.deny();
            }
            self.counters.denials += 1;
            self.emit_allocation(AllocationEvent::Denied {
                process: entry.process,
                resource: entry.resource,
                units: entry.units,
                reason,
            });
        }
        self.waiting.restore(remaining);
    }

    /// Grant every waiting entry that is eligible now, in FIFO order
    ///
    /// Each entry is judged against the state left by grants earlier in the
    /// same pass. Entries of terminated processes are dropped untested.
    pub(crate) fn rescan_waiting(&mut self) {
        if self.waiting.is_empty() {
            return;
        }
        let mut remaining = VecDeque::new();
        for entry in self.waiting.take() {
            let terminated = self
                .registry
                .process(entry.process)
                .map_or(true, Process::is_terminated);
            if terminated {
                continue;
            }
            if self.grant_waiting(entry) {
                self.counters.grants += 1;
                self.emit_allocation(AllocationEvent::WaitingGranted {
                    process: entry.process,
                    resource: entry.resource,
                    units: entry.units,
                });
            } else {
                remaining.push_back(entry);
            }
        }
        self.waiting.restore(remaining);
    }

    fn grant_waiting(&mut self, entry: WaitingRequest) -> bool {
        let WaitingRequest {
            process,
            resource,
            units,
        } = entry;
        match self.mode {
            Mode::Detection | Mode::Prevention => self.registry.allocate(process, resource, units),
            Mode::Avoidance => {
                if self.banker.available(resource) < units
                    || !self.banker.is_safe(process, resource, units)
                    || !self.registry.allocate(process, resource, units)
                {
                    return false;
                }
                self.banker.commit(process, resource, units);
                true
            }
        }
    }

    /// Read-only view of the whole system
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let avoidance = self.mode == Mode::Avoidance;
        Snapshot {
            mode: self.mode,
            step: self.step,
            processes: self
                .registry
                .processes()
                .map(|p| (p.id(), p.view(avoidance)))
                .collect(),
            resources: self
                .registry
                .resources()
                .map(|r| (r.id(), r.view()))
                .collect(),
            waiting_queue: self.waiting.iter().map(WaitingRequest::view).collect(),
            banker: avoidance.then(|| self.banker.view()),
            last_cycle: self.last_cycle.clone(),
            victim_policy: self.policy.name().to_string(),
            counters: self.counters,
        }
    }

    /// Recompute every cross-collection invariant
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvariantViolated`] describing the first
    /// mismatch found.
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        let violated = |message: String| SimulationError::InvariantViolated { message };

        self.registry.verify().map_err(violated)?;
        if self.mode == Mode::Avoidance {
            self.banker.verify(&self.registry).map_err(violated)?;
        }

        let mut queued: BTreeMap<ProcessId, usize> = BTreeMap::new();
        for entry in self.waiting.iter() {
            *queued.entry(entry.process).or_insert(0) += 1;
        }
        for process in self.registry.processes() {
            let entries = queued.get(&process.id()).copied().unwrap_or(0);
            match process.state() {
                ProcessState::Waiting if entries != 1 => {
                    return Err(violated(format!(
                        "{} is waiting with {entries} queue entries",
                        process.id()
                    )));
                }
                ProcessState::Terminated if !process.holds_nothing() || entries > 0 => {
                    return Err(violated(format!(
                        "terminated {} still holds resources or waits",
                        process.id()
                    )));
                }
                ProcessState::Ready | ProcessState::Running if entries > 0 => {
                    return Err(violated(format!(
                        "{} is {} but has a queued request",
                        process.id(),
                        process.state()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
