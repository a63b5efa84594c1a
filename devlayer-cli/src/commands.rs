use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use devlayer_config::DevLayerConfig;
use devlayer_core::events::Event;
use devlayer_core::registry::EventHandler;
use devlayer_core::stats::StatsSnapshot;
use devlayer_engine::{HostPlatform, PlatformManager, PlatformManagerBuilder};
use devlayer_telemetry::MetricsRecorder;

use crate::scenario::{Scenario, ScenarioSecurity, ScenarioStep};

#[derive(Parser)]
#[command(name = "devlayer", version, about)]
pub struct Cli {
    /// Configuration file layered over the defaults (instead of `config/`)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Feed a scenario file through the stack and print what happened
    Replay(ReplayArgs),
    /// Run the host event loop until Ctrl-C or the duration elapses
    Run(RunArgs),
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[arg(short, long)]
    pub scenario: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<DevLayerConfig> {
        match &self.config {
            Some(path) => DevLayerConfig::load_from_path(path)
                .with_context(|| format!("failed to load configuration from {}", path.display())),
            None => DevLayerConfig::load().context("failed to load configuration"),
        }
    }
}

pub async fn run_command(command: Commands, config: DevLayerConfig) -> anyhow::Result<()> {
    match command {
        Commands::Replay(args) => run_replay(args, &config),
        Commands::Run(args) => run_event_loop(args, &config).await,
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

fn metrics_for(config: &DevLayerConfig) -> anyhow::Result<Option<Arc<MetricsRecorder>>> {
    if !config.telemetry.enable_metrics {
        return Ok(None);
    }
    Ok(Some(Arc::new(
        MetricsRecorder::new().context("failed to create metrics registry")?,
    )))
}

fn builder(config: &DevLayerConfig, metrics: &Option<Arc<MetricsRecorder>>) -> PlatformManagerBuilder {
    let builder = PlatformManagerBuilder::from_config(Arc::new(HostPlatform::new()), config);
    match metrics {
        Some(metrics) => builder.observer(metrics.clone()),
        None => builder,
    }
}

fn logging_handler() -> EventHandler {
    EventHandler::new(|event: &Event| {
        info!(event_type = %event.event_type(), ?event, "Application received event");
        Ok(())
    })
}

fn run_replay(args: ReplayArgs, config: &DevLayerConfig) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let metrics = metrics_for(config)?;
    let security = Arc::new(ScenarioSecurity::default());
    let manager = builder(config, &metrics)
        .security_manager(security.clone())
        .build()?;

    manager.init_stack()?;
    manager.add_event_handler(logging_handler())?;

    info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let capacity = config.core.event_queue.capacity;
    for (index, step) in scenario.steps.into_iter().enumerate() {
        // Keep room for the next step instead of failing on a full queue.
        if manager.pending() >= capacity {
            manager.run_cycle();
        }

        match step {
            ScenarioStep::Event { event } => manager
                .post_event(event)
                .with_context(|| format!("step {index}: failed to post event"))?,
            ScenarioStep::Work { label } => manager
                .schedule_work(move || info!(%label, "Running scenario work"))
                .with_context(|| format!("step {index}: failed to schedule work"))?,
            ScenarioStep::SessionEstablished { record, auth_mode } => {
                if !security.complete_session(record, auth_mode) {
                    warn!(step = index, "No session callback installed, session dropped");
                }
            }
        }
    }

    drain(&manager);
    manager.shutdown()?;
    print_summary(&manager.stats());
    print_metrics(&metrics)?;
    Ok(())
}

/// Runs cycles until the queue stays empty.
fn drain(manager: &PlatformManager) -> usize {
    let mut total = 0;
    loop {
        let ran = manager.run_cycle();
        if ran == 0 {
            return total;
        }
        total += ran;
    }
}

async fn run_event_loop(args: RunArgs, config: &DevLayerConfig) -> anyhow::Result<()> {
    let metrics = metrics_for(config)?;
    let manager = builder(config, &metrics).build()?;
    manager.init_stack()?;
    manager.add_event_handler(logging_handler())?;

    let handle = manager.start_event_loop_task()?;
    info!(thread = handle.thread_name().unwrap_or("unnamed"), "Event loop running");

    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
                _ = tokio::time::sleep(Duration::from_secs(secs)) => info!(secs, "Run duration elapsed"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Interrupted");
        }
    }

    manager.shutdown()?;
    tokio::task::spawn_blocking(move || handle.stop()).await??;

    print_summary(&manager.stats());
    print_metrics(&metrics)?;
    Ok(())
}

fn print_summary(stats: &StatsSnapshot) {
    println!("Events dispatched: {}", stats.events_dispatched);
    println!("Work items run:    {}", stats.work_items_run);
    println!("Handler failures:  {}", stats.handler_failures);
    println!("Queue rejections:  {}", stats.queue_rejections);
}

fn print_metrics(metrics: &Option<Arc<MetricsRecorder>>) -> anyhow::Result<()> {
    if let Some(metrics) = metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}
