//! Event handling and live status output

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use dlsim_events::{AllocationEvent, AppEvent, DeadlockEvent, EventMessage, GeneralEvent, ModeEvent};

/// Prints notable engine events while a command runs
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    /// Print every event, not only notable ones
    verbose: bool,
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            verbose,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match &message.event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                let line = match context {
                    Some(context) => format!("{message} ({context})"),
                    None => message.clone(),
                };
                self.show_warning(&line);
            }
            AppEvent::General(GeneralEvent::OperationFailed { operation, failure }) => {
                self.show_error(&format!("{operation} failed: {}", failure.message));
            }
            AppEvent::Allocation(AllocationEvent::Denied {
                process,
                resource,
                units,
                reason,
            }) => {
                self.show_status(&format!("{process} denied {units} of {resource}: {reason}"));
            }
            AppEvent::Allocation(AllocationEvent::WaitingGranted {
                process,
                resource,
                units,
            }) => {
                self.show_status(&format!(
                    "{process} woke up with {units} of {resource}"
                ));
            }
            AppEvent::Deadlock(DeadlockEvent::CycleDetected { cycle }) => {
                let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                self.show_error(&format!("Deadlock: {}", members.join(" -> ")));
            }
            AppEvent::Deadlock(DeadlockEvent::VictimTerminated { victim, policy, .. }) => {
                self.show_error(&format!("Terminated {victim} ({policy})"));
            }
            AppEvent::Mode(ModeEvent::Switched { from, to }) => {
                self.show_status(&format!("Mode {from} -> {to}"));
            }
            event if self.verbose => {
                self.show_status(&format!("{event:?}"));
            }
            _ => {}
        }
    }

    fn show_status(&self, line: &str) {
        let text = if self.colors_enabled {
            style(line).cyan().to_string()
        } else {
            line.to_string()
        };
        let _ = self.term.write_line(&text);
    }

    fn show_warning(&self, line: &str) {
        let text = if self.colors_enabled {
            style(format!("warning: {line}")).yellow().to_string()
        } else {
            format!("warning: {line}")
        };
        let _ = self.term.write_line(&text);
    }

    fn show_error(&self, line: &str) {
        let text = if self.colors_enabled {
            style(line).red().bold().to_string()
        } else {
            line.to_string()
        };
        let _ = self.term.write_line(&text);
    }
}
