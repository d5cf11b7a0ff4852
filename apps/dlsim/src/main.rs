//! dlsim - Deadlock detection, prevention and avoidance simulator
//!
//! This is the CLI driver. It loads configuration, builds a coordinator,
//! drives it and renders the resulting snapshot while engine events are
//! logged and summarized on the terminal.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod report;
mod scenario;

use crate::cli::{Cli, Commands, GlobalArgs, SystemArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::report::{CommandResult, RunReport};
use clap::Parser;
use dlsim_config::Config;
use dlsim_coordinator::{Coordinator, SharedCoordinator};
use dlsim_errors::SimulationError;
use dlsim_events::{EventEmitter, EventReceiver, EventSender, FailureContext};
use dlsim_types::{ColorChoice, OutputFormat};
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // Run the application and handle errors
    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let json_mode = cli.global.json || config.general.default_output == OutputFormat::Json;
    init_tracing(json_mode, cli.global.debug, &config.general.log_dir);
    info!("Starting dlsim v{}", env!("CARGO_PKG_VERSION"));

    let (event_sender, event_receiver) = dlsim_events::channel();

    // Plain output never colors unless asked to
    let color = match (cli.global.color, config.general.default_output) {
        (Some(color), _) => color,
        (None, OutputFormat::Plain) => ColorChoice::Never,
        (None, _) => config.general.color,
    };
    let renderer = OutputRenderer::new(json_mode, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_mode);

    let result = execute_command_with_events(
        cli.command,
        config,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    config: Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: Config,
    events: EventSender,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Run { verify, .. } => {
            let report = run_autopilot(&config, events, verify).await?;
            Ok(CommandResult::Run(report))
        }

        Commands::Scenario { name } => {
            let report = scenario::replay(name, events)?;
            Ok(CommandResult::Scenario(report))
        }

        Commands::Snapshot { .. } => {
            let coordinator = configured(&config, events)?;
            Ok(CommandResult::Snapshot(coordinator.snapshot()))
        }
    }
}

/// Build a coordinator and populate a random system from `config`
fn configured(config: &Config, events: EventSender) -> Result<Coordinator, CliError> {
    let mut coordinator = Coordinator::builder()
        .with_config(config)
        .with_event_sender(events)
        .build();
    coordinator.configure(
        config.simulation.processes,
        config.simulation.resources,
        config.simulation.capacity_range(),
    )?;
    Ok(coordinator)
}

/// Drive a random system for `autopilot.steps` steps
async fn run_autopilot(
    config: &Config,
    events: EventSender,
    verify: bool,
) -> Result<RunReport, CliError> {
    let coordinator = configured(config, events.clone())?;
    let shared = SharedCoordinator::new(coordinator);

    events.emit_operation_started("run");
    match drive(&shared, config, verify).await {
        Ok((steps, deadlocks)) => {
            events.emit_operation_completed("run", true);
            Ok(RunReport {
                steps,
                deadlocks,
                verified: verify,
                snapshot: shared.snapshot().await,
            })
        }
        Err(e) => {
            events.emit_operation_failed("run", FailureContext::from_error(&e));
            Err(e.into())
        }
    }
}

/// Step loop of `run`, returning step descriptions and deadlock reports
async fn drive(
    shared: &SharedCoordinator,
    config: &Config,
    verify: bool,
) -> Result<(Vec<String>, Vec<String>), SimulationError> {
    let detect_every = config.autopilot.detect_every;
    let mut steps = Vec::with_capacity(config.autopilot.steps);
    let mut deadlocks = Vec::new();
    for step in 1..=config.autopilot.steps {
        steps.push(shared.auto_step().await?);

        if detect_every > 0 && step % detect_every == 0 && shared.detect().await {
            let cycle = shared.snapshot().await.last_cycle.unwrap_or_default();
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            deadlocks.push(format!(
                "DEADLOCK after step {step}: [{}]",
                members.join(", ")
            ));
        }

        if verify {
            shared.check_invariants().await?;
        }

        // Let the event loop render progress between steps
        tokio::task::yield_now().await;
    }
    Ok((steps, deadlocks))
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let filter = |default: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    };

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }
        let log_file = log_dir.join(format!(
            "dlsim-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter("info,dlsim=debug"))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn,dlsim=info"))
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Some(SystemArgs {
        mode,
        processes,
        resources,
        seed,
        victim_policy,
    }) = command.system()
    {
        if let Some(mode) = mode {
            config.simulation.mode = *mode;
        }
        if let Some(processes) = processes {
            config.simulation.processes = *processes;
        }
        if let Some(resources) = resources {
            config.simulation.resources = *resources;
        }
        if seed.is_some() {
            config.simulation.seed = *seed;
        }
        if let Some(policy) = victim_policy {
            config.simulation.victim_policy = *policy;
        }
    }

    if let Commands::Run {
        steps: Some(steps), ..
    } = command
    {
        config.autopilot.steps = *steps;
    }

    config
        .validate()
        .map_err(|e| CliError::InvalidArguments(e.to_string()))
}
