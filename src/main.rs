//! Falcosidekick operator.
//!
//! Reconciles a Falcosidekick workload from an event snapshot: charm options
//! and relation data in, workload files and a unit status out.
//!
//! # Architecture Overview
//!
//! ```text
//!   event snapshot (TOML)            ┌──────────────────────────────────────────┐
//!   ─────────────────────────────────┼─▶ config ──▶ charm::EventContext         │
//!                                    │                    │                     │
//!                                    │                    ▼                     │
//!                                    │   state::ConfigResolver ──▶ ResolvedConfig│
//!                                    │                    │                     │
//!                                    │                    ▼                     │
//!                                    │   certificates::CertificateReconciler    │
//!                                    │   workload::Falcosidekick                │
//!                                    │                    │                     │
//!   workload filesystem  ◀───────────┼── workload::WorkloadStorage              │
//!                                    │                    │                     │
//!   report (JSON, stdout) ◀──────────┼── charm::ReconcileReport ──▶ health probe│
//!                                    └──────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use falcosidekick_operator::charm::{
    EventContext, FalcosidekickOperator, ReconcileReport, StatefulOperator, Trigger, UnitStatus,
};
use falcosidekick_operator::config::watcher::SnapshotWatcher;
use falcosidekick_operator::config::{load_snapshot, EventSnapshot};
use falcosidekick_operator::health::HealthProbe;
use falcosidekick_operator::observability::logging::init_logging;
use falcosidekick_operator::workload::RootedFilesystem;

#[derive(Parser)]
#[command(name = "falcosidekick-operator")]
#[command(about = "Reconcile a Falcosidekick workload from an event snapshot", long_about = None)]
struct Cli {
    /// Event snapshot describing options and relation data.
    #[arg(short, long, default_value = "snapshot.toml")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single reconciliation pass and print the report
    Reconcile {
        #[arg(long, value_enum, default_value_t = Event::ConfigChanged)]
        event: Event,

        /// Probe the workload's healthcheck port after configuring it
        #[arg(long)]
        probe: bool,
    },
    /// Reconcile again every time the snapshot changes
    Watch {
        #[arg(long)]
        probe: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Event {
    Install,
    ConfigChanged,
    PebbleReady,
    RelationChanged,
}

impl From<Event> for Trigger {
    fn from(event: Event) -> Self {
        match event {
            Event::Install => Trigger::Install,
            Event::ConfigChanged => Trigger::ConfigChanged,
            Event::PebbleReady => Trigger::PebbleReady,
            Event::RelationChanged => Trigger::RelationChanged,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let snapshot = load_snapshot(&cli.snapshot);
    let log_level = snapshot
        .as_ref()
        .map(|s| s.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(&log_level);
    let snapshot = snapshot?;

    tracing::info!(
        snapshot = %cli.snapshot.display(),
        workload_root = %snapshot.workload.root.display(),
        "falcosidekick-operator v0.1.0 starting"
    );

    match cli.command {
        Commands::Reconcile { event, probe } => {
            let report = run_pass(&snapshot, event.into(), probe).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch { probe } => watch(&cli.snapshot, snapshot, probe).await?,
    }

    Ok(())
}

/// One reconciliation pass. Nothing carries over between passes.
async fn run_pass(
    snapshot: &EventSnapshot,
    trigger: Trigger,
    probe: bool,
) -> Result<ReconcileReport, Box<dyn std::error::Error>> {
    let context = EventContext::from_snapshot(snapshot)?;
    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(&snapshot.workload.root));

    let report = match operator.reconcile(trigger, &context) {
        Ok(report) => report,
        Err(e) if e.is_transient() => {
            tracing::warn!(error = %e, "Workload unreachable, will retry on the next trigger");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        status = %report.status,
        restart_required = report.restart_required,
        "Reconciliation finished"
    );

    if probe && report.status == UnitStatus::Active {
        if let Some(state) = &report.state {
            let timeout = Duration::from_secs(snapshot.workload.probe_timeout_secs);
            let prober = HealthProbe::new(timeout)?;
            if !prober.check_workload(&snapshot.workload.probe_host, state).await {
                tracing::error!(container = "falcosidekick", "Workload is not healthy");
                return Err("Workload not healthy".into());
            }
        }
    }

    Ok(report)
}

async fn watch(
    path: &Path,
    initial: EventSnapshot,
    probe: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (watcher, mut updates) = SnapshotWatcher::new(path);
    let _handle = watcher.run()?;

    report_pass(run_pass(&initial, Trigger::PebbleReady, probe).await);

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(snapshot) = update else { break };
                report_pass(run_pass(&snapshot, Trigger::ConfigChanged, probe).await);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, exiting");
                break;
            }
        }
    }

    Ok(())
}

fn report_pass(result: Result<ReconcileReport, Box<dyn std::error::Error>>) {
    match result {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
        },
        Err(e) => tracing::error!(error = %e, "Reconciliation pass failed"),
    }
}
