use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tickr::daemon::{Heartbeat, TickConfig};
use tickr::{DateTimeUnit, ExecutionStats, PeriodicTaskManager, ScheduledTaskManager};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    // RUST_LOG wins over the configured level
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) if cli.is_verbose() => {
            builder.parse_filters("debug");
        }
        Err(_) => {
            builder.parse_filters(config.log_level.as_deref().unwrap_or("info"));
        }
    }

    if let Some(log_file) = &config.log_file {
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let target = Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .context("Failed to open log file")?,
        );
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.try_init().context("Failed to initialize logger")?;

    info!("Logging initialized");
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            seconds,
            once,
            tick_ms,
            json,
        } => handle_run_command(*seconds, once, *tick_ms, *json, config),
        Commands::Config => handle_config_command(config),
        Commands::Units => handle_units_command(),
    }
}

fn handle_run_command(
    seconds: Option<u64>,
    once: &[u64],
    tick_ms: Option<u64>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let periodic = Arc::new(PeriodicTaskManager::new(
        config.periodic.discard_error_task,
        config.periodic.warning_elapsed_ms,
    ));
    let scheduled = Arc::new(ScheduledTaskManager::new(config.scheduled.warning_elapsed_ms));

    for definition in &config.tasks {
        let name = definition.name.clone();
        let task = definition
            .build(move || {
                println!("{} {}", chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(), name.green());
                Ok(())
            })
            .context(format!("Invalid task definition: {}", definition.name))?;
        periodic.add_task(Arc::new(task)).context("Failed to register periodic task")?;
    }

    for (index, delay_ms) in once.iter().enumerate() {
        let name = format!("once-{}-{}ms", index, delay_ms);
        let label = name.clone();
        scheduled.schedule_fn(*delay_ms, name, move || {
            println!("{} {}", chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(), label.cyan());
            Ok(())
        });
    }

    let tick_config = TickConfig::from_millis(tick_ms.unwrap_or(config.tick.tick_interval_ms));
    let mut heartbeat = Heartbeat::new(tick_config)
        .with_target(periodic.clone())
        .with_target(scheduled.clone());

    println!(
        "{} {} periodic, {} one-shot",
        "Running:".green(),
        config.tasks.len(),
        once.len()
    );

    match seconds {
        Some(secs) => heartbeat.run_for(Duration::from_secs(secs)),
        None => {
            // No signal handling: the process is stopped by killing it, so stats are never printed
            println!("{}", "Running until killed; pass --seconds to stop and print stats".yellow());
            heartbeat.run();
        }
    }

    if json {
        let report = serde_json::json!({
            "passes": heartbeat.state().tick_count,
            "overruns": heartbeat.state().overruns,
            "periodic": periodic.stats(),
            "scheduled": scheduled.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize stats")?);
        return Ok(());
    }

    let state = heartbeat.state();
    println!(
        "{} {} passes, {} overruns, longest {:?}",
        "Heartbeat:".green(),
        state.tick_count,
        state.overruns,
        state.max_pass
    );
    print_stats("Periodic:", &periodic.stats());
    print_stats("Scheduled:", &scheduled.stats());
    Ok(())
}

fn print_stats(label: &str, stats: &ExecutionStats) {
    println!(
        "{} executed {}, failed {}, slow {}, removed {}",
        label.green(),
        stats.executed,
        stats.failed.to_string().red(),
        stats.slow.to_string().yellow(),
        stats.removed
    );
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

fn handle_units_command() -> Result<()> {
    for unit in DateTimeUnit::ALL {
        println!("{}", unit.as_str().cyan());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&cli, &config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
