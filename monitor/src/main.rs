use anyhow::{bail, Context};
use bridge::bridge::Bridge;
use clap::Parser;
use curbcore::interface::DeliveryEvent;
use curbcore::reporting::{channel, DeliveryWorker};
use curbcore::session::{MonitorSession, SessionCommand};
use curbcore::telemetry::MetricsRecorder;
use generator::scene::{build_scene, SceneConfig};
use log::{info, warn};
use reporting::{EvidenceStore, HttpReporter};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::mpsc;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;
use workflow::source::load_frames;

mod bridge;
mod generator;
mod reporting;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Curb occupancy and restricted-zone monitor")]
struct Args {
    /// JSON-lines detector output, one frame per line
    #[arg(long)]
    frames: Option<PathBuf>,
    /// Run on a generated scene instead of recorded frames
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Override the reporting endpoint
    #[arg(long)]
    report_url: Option<String>,
    /// Override the stability dwell, in seconds
    #[arg(long)]
    dwell: Option<f64>,
    /// Append the run summary as a JSON line to this file
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Keep the HTTP bridge alive after the stream ends
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    if let Some(url) = args.report_url.clone() {
        workflow_config.report_url = url;
    }
    if let Some(dwell) = args.dwell {
        workflow_config.dwell_secs = dwell;
    }

    let frames = match (&args.frames, args.synthetic) {
        (Some(path), false) => load_frames(path)?,
        (None, true) => build_scene(&SceneConfig::default())?,
        (Some(_), true) => bail!("--frames and --synthetic are mutually exclusive"),
        (None, false) => bail!("no frame source: pass --frames <path> or --synthetic"),
    };

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating delivery runtime")?;

    let metrics = Arc::new(MetricsRecorder::new());
    let (emitter, queue) = channel(workflow_config.queue_capacity, metrics.clone());
    let reporter = HttpReporter::new(
        workflow_config.report_url.clone(),
        workflow_config.report_timeout_secs,
        workflow_config.evidence_dir.clone().map(EvidenceStore::new),
    )?;
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let worker = runtime.spawn(
        DeliveryWorker::new(queue, reporter, metrics.clone())
            .with_outcomes(outcome_tx)
            .run(),
    );
    runtime.spawn(async move {
        while let Some(event) = outcome_rx.recv().await {
            if let DeliveryEvent::Failed { count, reason } = &event {
                warn!("report for count {} not delivered: {}", count, reason);
            }
        }
    });

    let mut session = MonitorSession::new(workflow_config.to_engine_config(), emitter, metrics.clone())
        .context("starting monitoring session")?;
    if let Some([a, b]) = workflow_config.calibration_points {
        for point in [a, b] {
            session
                .apply(SessionCommand::CalibrationPoint {
                    x: point.x,
                    y: point.y,
                })
                .context("applying configured calibration line")?;
        }
    }

    let (bridge, commands) = Bridge::new();
    if args.serve {
        bridge.serve(workflow_config.bridge_addr)?;
    }

    let mut runner = Runner::new(session, workflow_config.status_every).with_commands(commands);
    let summary = runner.execute(frames, Some(&bridge))?;
    // Dropping the runner closes the queue so the worker can drain and stop.
    drop(runner);

    let delivered = runtime
        .block_on(worker)
        .context("joining delivery worker")?;
    let totals = metrics.snapshot();

    println!(
        "Run -> frames {}, stable events {}, handed to reporter {}, delivered {}, failed {}, dropped {}",
        summary.frames,
        summary.events,
        delivered,
        totals.delivered,
        totals.delivery_failures,
        totals.events_dropped
    );
    match summary.last_free_length {
        Some(free) => println!("Last frame -> {} in zone, {:.2} free", summary.last_zone_count, free),
        None => println!("Last frame -> {} in zone, curb uncalibrated", summary.last_zone_count),
    }

    if let Some(summary_path) = &args.summary {
        if let Some(parent) = summary_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(summary_path)
            .with_context(|| format!("opening summary {}", summary_path.display()))?;
        let line = serde_json::to_string(&summary).context("serializing run summary")?;
        writeln!(file, "{}", line)?;
        info!("summary appended to {}", summary_path.display());
    }

    if args.serve {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
