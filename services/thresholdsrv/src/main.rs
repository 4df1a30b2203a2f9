//! Thresholdsrv - threshold alarm handler runner
//!
//! Replays the threshold handlers against an inventory fixture:
//! enrich an alarm file, dispatch a notification, or print the
//! effective configuration.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fm_platform::{
    Alarm, EscalationNotice, MemoryPlatform, PlaceholderRenderer, PlatformPorts,
    RecordingScheduler,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thresholdsrv::{logging, ThresholdConfig, ThresholdService};
use tracing::info;

#[derive(Parser)]
#[command(name = "thresholdsrv")]
#[command(about = "Interface threshold alarm enrichment and escalation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "THRESHOLDSRV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich an alarm and run its escalation
    Enrich {
        /// Inventory fixture (YAML)
        #[arg(short, long)]
        inventory: PathBuf,
        /// Managed object name
        #[arg(short, long)]
        object: String,
        /// Alarm file (JSON)
        #[arg(short, long)]
        alarm: PathBuf,
        /// Print scheduled notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Send a notification to a group
    Dispatch {
        /// Inventory fixture (YAML)
        #[arg(short, long)]
        inventory: PathBuf,
        /// Notification group id
        #[arg(short, long)]
        group: u64,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ThresholdConfig::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;

    match cli.command {
        Command::Enrich {
            inventory,
            object,
            alarm,
            dry_run,
        } => enrich(&config, &inventory, &object, &alarm, dry_run).await,
        Command::Dispatch {
            inventory,
            group,
            subject,
            body,
        } => dispatch(&config, &inventory, group, subject, body).await,
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        },
    }
}

fn load_platform(inventory: &Path) -> Result<Arc<MemoryPlatform>> {
    let platform = MemoryPlatform::load_yaml(inventory)
        .with_context(|| format!("Failed to load inventory {}", inventory.display()))?;
    Ok(Arc::new(platform))
}

async fn enrich(
    config: &ThresholdConfig,
    inventory: &Path,
    object: &str,
    alarm_path: &Path,
    dry_run: bool,
) -> Result<()> {
    let platform = load_platform(inventory)?;
    let mo = platform
        .managed_object(object)
        .ok_or_else(|| anyhow!("Managed object not found: {}", object))?;

    let source = std::fs::read_to_string(alarm_path)
        .with_context(|| format!("Failed to read alarm {}", alarm_path.display()))?;
    let mut alarm: Alarm = serde_json::from_str(&source)?;

    let ports = PlatformPorts::from_backend(platform, Arc::new(PlaceholderRenderer::new()));

    if dry_run {
        let recorder = Arc::new(RecordingScheduler::new());
        let service = ThresholdService::with_scheduler(&ports, recorder.clone(), config);
        service.enricher.handle(&mo, &mut alarm).await?;

        println!("{}", serde_json::to_string_pretty(&alarm)?);
        for call in recorder.calls() {
            println!("{}", serde_json::to_string_pretty(&call)?);
        }
    } else {
        let (service, scheduler) = ThresholdService::with_tokio_scheduler(&ports, config);
        service.enricher.handle(&mo, &mut alarm).await?;

        println!("{}", serde_json::to_string_pretty(&alarm)?);
        let status = scheduler.status();
        if status.pending > 0 {
            info!("Waiting for {} scheduled notifications", status.pending);
        }
        scheduler.drain().await;
        info!("Scheduler finished: {:?}", scheduler.status());
    }

    Ok(())
}

async fn dispatch(
    config: &ThresholdConfig,
    inventory: &Path,
    group: u64,
    subject: String,
    body: String,
) -> Result<()> {
    let platform = load_platform(inventory)?;
    let ports = PlatformPorts::from_backend(platform, Arc::new(PlaceholderRenderer::new()));
    let (service, _scheduler) = ThresholdService::with_tokio_scheduler(&ports, config);

    service
        .dispatcher
        .dispatch(&EscalationNotice {
            notification_group_id: group,
            subject,
            body,
        })
        .await;
    Ok(())
}
