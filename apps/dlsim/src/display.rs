//! Output rendering and formatting

use crate::report::{CommandResult, RunReport, ScenarioReport};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use dlsim_types::{ColorChoice, ProcessState, Snapshot, Units};
use std::fmt::Display;
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &CommandResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted tables
    fn render_table(&self, result: &CommandResult) -> io::Result<()> {
        match result {
            CommandResult::Run(report) => self.render_run(report),
            CommandResult::Scenario(report) => self.render_scenario(report),
            CommandResult::Snapshot(snapshot) => self.render_snapshot(snapshot),
        }
    }

    fn render_run(&self, report: &RunReport) -> io::Result<()> {
        for (idx, line) in report.steps.iter().enumerate() {
            self.term.write_line(&format!("{:>4}  {}", idx + 1, self.style_outcome(line)))?;
        }
        for line in &report.deadlocks {
            self.term
                .write_line(&self.paint(line, &Style::new().red().bold()))?;
        }
        if report.verified {
            self.term.write_line(&self.paint(
                "[OK] invariants held after every step",
                &Style::new().green(),
            ))?;
        }
        self.term.write_line("")?;
        self.render_snapshot(&report.snapshot)
    }

    fn render_scenario(&self, report: &ScenarioReport) -> io::Result<()> {
        self.term.write_line(&self.paint(
            &format!("Scenario: {}", report.name),
            &Style::new().bold(),
        ))?;

        let mut table = self.table();
        table.set_header(vec![header("Action"), header("Result")]);
        for step in &report.steps {
            table.add_row(vec![
                Cell::new(&step.action),
                self.outcome_cell(&step.result),
            ]);
        }
        self.term.write_line(&table.to_string())?;
        self.term.write_line("")?;
        self.render_snapshot(&report.snapshot)
    }

    /// Render every section of a snapshot
    fn render_snapshot(&self, snapshot: &Snapshot) -> io::Result<()> {
        self.term.write_line(&format!(
            "Mode: {}   Step: {}   Victim policy: {}",
            self.paint(snapshot.mode.as_str(), &Style::new().bold()),
            snapshot.step,
            snapshot.victim_policy
        ))?;

        let mut processes = self.table();
        processes.set_header(vec![
            header("Process"),
            header("State"),
            header("Holding"),
            header("Waiting for"),
            header("Maximum"),
        ]);
        for (pid, view) in &snapshot.processes {
            let waiting = view
                .waiting_for
                .map_or_else(|| "-".to_string(), |(rid, units)| format!("{rid} x{units}"));
            processes.add_row(vec![
                Cell::new(pid),
                self.state_cell(view.state),
                Cell::new(units(&view.held)),
                Cell::new(waiting),
                Cell::new(units(&view.maximum_demand)),
            ]);
        }
        self.term.write_line(&processes.to_string())?;

        let mut resources = self.table();
        resources.set_header(vec![
            header("Resource"),
            header("Total"),
            header("Available"),
            header("Allocated"),
        ]);
        for (rid, view) in &snapshot.resources {
            resources.add_row(vec![
                Cell::new(rid),
                Cell::new(view.total),
                Cell::new(view.available),
                Cell::new(units(&view.allocated)),
            ]);
        }
        self.term.write_line(&resources.to_string())?;

        if !snapshot.waiting_queue.is_empty() {
            let mut queue = self.table();
            queue.set_header(vec![header("#"), header("Process"), header("Resource"), header("Units")]);
            for (idx, entry) in snapshot.waiting_queue.iter().enumerate() {
                queue.add_row(vec![
                    Cell::new(idx + 1),
                    Cell::new(entry.process),
                    Cell::new(entry.resource),
                    Cell::new(entry.units),
                ]);
            }
            self.term.write_line("Waiting queue")?;
            self.term.write_line(&queue.to_string())?;
        }

        if let Some(banker) = &snapshot.banker {
            let mut matrix = self.table();
            matrix.set_header(vec![header("Process"), header("Allocation"), header("Need")]);
            for (pid, allocation) in &banker.allocation {
                let need = banker.need.get(pid).map(units).unwrap_or_default();
                matrix.add_row(vec![
                    Cell::new(pid),
                    Cell::new(units(allocation)),
                    Cell::new(need),
                ]);
            }
            self.term
                .write_line(&format!("Banker available: {}", units(&banker.available)))?;
            self.term.write_line(&matrix.to_string())?;
        }

        if let Some(cycle) = &snapshot.last_cycle {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            self.term
                .write_line(&format!("Last cycle: {}", members.join(" -> ")))?;
        }

        let c = &snapshot.counters;
        let mut counters = self.table();
        counters.set_header(vec![
            header("Requests"),
            header("Grants"),
            header("Waits"),
            header("Denials"),
            header("Preventions"),
            header("Avoidances"),
            header("Deadlocks"),
            header("Recoveries"),
            header("Releases"),
        ]);
        counters.add_row(vec![
            c.requests,
            c.grants,
            c.waits,
            c.denials,
            c.preventions,
            c.avoidances,
            c.deadlocks,
            c.recoveries,
            c.releases,
        ]);
        self.term.write_line(&counters.to_string())
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    fn colors_enabled(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }

    fn paint(&self, text: &str, style: &Style) -> String {
        if self.colors_enabled() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn state_cell(&self, state: ProcessState) -> Cell {
        let cell = Cell::new(state);
        if !self.colors_enabled() {
            return cell;
        }
        match state {
            ProcessState::Ready => cell,
            ProcessState::Running => cell.fg(Color::Green),
            ProcessState::Waiting => cell.fg(Color::Yellow),
            ProcessState::Terminated => cell.fg(Color::Red),
        }
    }

    fn outcome_cell(&self, result: &str) -> Cell {
        let cell = Cell::new(result);
        if !self.colors_enabled() {
            return cell;
        }
        match outcome_color(result) {
            Some(color) => cell.fg(color),
            None => cell,
        }
    }

    fn style_outcome(&self, line: &str) -> String {
        let style = match outcome_color(line) {
            Some(Color::Green) => Style::new().green(),
            Some(Color::Yellow) => Style::new().yellow(),
            Some(Color::Red) => Style::new().red(),
            _ => return line.to_string(),
        };
        self.paint(line, &style)
    }
}

fn header(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold)
}

fn outcome_color(text: &str) -> Option<Color> {
    if text.contains("GRANTED") {
        Some(Color::Green)
    } else if text.contains("WAITING") {
        Some(Color::Yellow)
    } else if text.contains("DENIED") || text.contains("DEADLOCK") {
        Some(Color::Red)
    } else {
        None
    }
}

/// `R0:2 R1:1`, or `-` when empty
fn units<K: Display>(map: &Units<K>) -> String {
    if map.is_empty() {
        return "-".to_string();
    }
    map.iter()
        .map(|(key, units)| format!("{key}:{units}"))
        .collect::<Vec<_>>()
        .join(" ")
}
