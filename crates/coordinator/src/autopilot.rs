//! Scripted random driver used by demos and soak tests

use crate::Coordinator;
use dlsim_errors::SimulationError;
use dlsim_events::{AppEvent, EventEmitter, SimulationEvent};
use dlsim_types::{ProcessId, ResourceId};
use rand::seq::SliceRandom;
use rand::Rng;

impl Coordinator {
    /// Let one random schedulable process request or release something
    ///
    /// Requests happen with `autopilot.request_probability`, for
    /// `1..=min(max_request_units, capacity)` units of a random resource.
    /// Otherwise the process releases part of a random holding. Returns a
    /// one-line description of what happened.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotConfigured`] before a system is loaded.
    pub fn auto_step(&mut self) -> Result<String, SimulationError> {
        if self.registry.process_count() == 0 || self.registry.resource_count() == 0 {
            return Err(SimulationError::NotConfigured);
        }

        let candidates: Vec<ProcessId> = self
            .registry
            .processes()
            .filter(|p| p.state().is_schedulable())
            .map(dlsim_resources::Process::id)
            .collect();
        let Some(&process) = candidates.choose(&mut self.rng) else {
            return Ok(self.describe("All processes are terminated or waiting".to_string()));
        };

        let description = if self.rng.gen::<f64>() < self.autopilot.request_probability {
            self.auto_request(process)
        } else {
            self.auto_release(process)
        };
        Ok(self.describe(description))
    }

    fn auto_request(&mut self, process: ProcessId) -> String {
        let index = self.rng.gen_range(0..self.registry.resource_count());
        let resource = ResourceId::new(u32::try_from(index).unwrap_or(0));
        let total = self
            .registry
            .resource(resource)
            .map_or(1, dlsim_resources::Resource::total_units);
        let ceiling = self.autopilot.max_request_units.min(total).max(1);
        let units = self.rng.gen_range(1..=ceiling);

        match self.request(process, resource, units) {
            Ok(outcome) => format!("Auto: {process} requested {units} of {resource}: {outcome}"),
            Err(err) => format!("Auto: {process} requested {units} of {resource}: ERROR - {err}"),
        }
    }

    fn auto_release(&mut self, process: ProcessId) -> String {
        let held: Vec<(ResourceId, u32)> = self
            .registry
            .process(process)
            .map(|p| p.held().collect())
            .unwrap_or_default();
        let Some(&(resource, max_units)) = held.choose(&mut self.rng) else {
            return format!("{process} has no resources to release");
        };
        let units = self.rng.gen_range(1..=max_units);

        match self.release(process, resource, Some(units)) {
            Ok(released) => format!("Auto: {process} released {released} of {resource}"),
            Err(err) => format!("Auto: {process} release of {resource} failed: {err}"),
        }
    }

    fn describe(&self, description: String) -> String {
        self.emit(AppEvent::Simulation(SimulationEvent::AutoStep {
            description: description.clone(),
        }));
        description
    }
}
