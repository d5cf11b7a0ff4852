//! Built-in textbook scenarios

use crate::cli::ScenarioName;
use crate::error::CliError;
use crate::report::{ScenarioReport, ScenarioStep};
use dlsim_coordinator::{Coordinator, Topology};
use dlsim_events::EventSender;
use dlsim_types::{Mode, ProcessId, ResourceId, VictimPolicyKind};

pub fn replay(name: ScenarioName, events: EventSender) -> Result<ScenarioReport, CliError> {
    let mut script = Script::default();
    let coordinator = match name {
        ScenarioName::Banker => banker(&mut script, events)?,
        ScenarioName::Detection => detection(&mut script, events)?,
        ScenarioName::Prevention => prevention(&mut script, events)?,
    };
    Ok(ScenarioReport {
        name: format!("{name:?}").to_lowercase(),
        steps: script.steps,
        snapshot: coordinator.snapshot(),
    })
}

#[derive(Default)]
struct Script {
    steps: Vec<ScenarioStep>,
}

impl Script {
    fn request(
        &mut self,
        c: &mut Coordinator,
        process: u32,
        resource: u32,
        units: u32,
    ) -> Result<(), CliError> {
        let (pid, rid) = (ProcessId::new(process), ResourceId::new(resource));
        let outcome = c.request(pid, rid, units)?;
        self.steps.push(ScenarioStep::new(
            format!("{pid} requests {units} of {rid}"),
            outcome,
        ));
        Ok(())
    }

    fn release(
        &mut self,
        c: &mut Coordinator,
        process: u32,
        resource: u32,
        units: u32,
    ) -> Result<(), CliError> {
        let (pid, rid) = (ProcessId::new(process), ResourceId::new(resource));
        let released = c.release(pid, rid, Some(units))?;
        self.steps.push(ScenarioStep::new(
            format!("{pid} releases {units} of {rid}"),
            format!("RELEASED {released}"),
        ));
        Ok(())
    }
}

fn build(
    topology: &Topology,
    mode: Mode,
    events: EventSender,
) -> Result<Coordinator, CliError> {
    Ok(Coordinator::builder()
        .with_mode(mode)
        .with_victim_policy(VictimPolicyKind::FirstInCycle)
        .with_seed(0)
        .with_event_sender(events)
        .load(topology)?)
}

/// Totals {10,5,7}; P0 holds {1,2,2} of max {7,5,3}, P1 holds {2,0,0} of max {3,2,2}
fn banker(script: &mut Script, events: EventSender) -> Result<Coordinator, CliError> {
    let topology = Topology::new(vec![10, 5, 7])
        .with_process(vec![7, 5, 3])
        .with_process(vec![3, 2, 2]);
    let mut c = build(&topology, Mode::Avoidance, events)?;
    for (p, r, units) in [(0, 0, 1), (0, 1, 2), (0, 2, 2), (1, 0, 2)] {
        script.request(&mut c, p, r, units)?;
    }
    script.request(&mut c, 1, 0, 1)?;
    script.release(&mut c, 1, 0, 1)?;
    script.request(&mut c, 1, 0, 4)?;
    Ok(c)
}

/// P0 holds R0 and waits for R1 while P1 holds R1 and waits for R0
fn detection(script: &mut Script, events: EventSender) -> Result<Coordinator, CliError> {
    let topology = Topology::new(vec![1, 1])
        .with_process(vec![1, 1])
        .with_process(vec![1, 1]);
    let mut c = build(&topology, Mode::Detection, events)?;
    script.request(&mut c, 0, 0, 1)?;
    script.request(&mut c, 1, 1, 1)?;
    script.request(&mut c, 0, 1, 1)?;
    script.request(&mut c, 1, 0, 1)?;

    let found = c.detect();
    let result = match (found, c.snapshot().last_cycle) {
        (true, Some(cycle)) => {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            format!(
                "DEADLOCK - cycle [{}], victim {}",
                members.join(", "),
                members.first().map_or("-", String::as_str)
            )
        }
        _ => "no deadlock".to_string(),
    };
    script.steps.push(ScenarioStep::new("detect", result));
    Ok(c)
}

/// Resources ranked R0 < R1 < R2
fn prevention(script: &mut Script, events: EventSender) -> Result<Coordinator, CliError> {
    let topology = Topology::new(vec![1, 1, 1])
        .with_process(vec![1, 1, 1])
        .with_process(vec![1, 1, 1]);
    let mut c = build(&topology, Mode::Prevention, events)?;
    script.request(&mut c, 0, 1, 1)?;
    script.request(&mut c, 0, 0, 1)?;
    script.request(&mut c, 0, 2, 1)?;
    script.request(&mut c, 1, 0, 1)?;
    script.request(&mut c, 1, 2, 1)?;
    Ok(c)
}
