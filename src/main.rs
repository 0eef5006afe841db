//! Guided Capture CLI
//!
//! Runs a complete guided session: front, left and right captures with
//! live exposure, glare and pose guidance. Without the `camera` feature the
//! synthetic placeholder feed is used; the face detector is scripted to
//! sweep through the three poses.

use clap::Parser;
use guided_capture::{
    analysis::ScriptedDetector,
    capture::{Camera, FileConfig, SourceStatus},
    feedback::TracingFeedback,
    metrics::{MetricsRegistry, MetricsSnapshot},
    pipeline::{LiveCaptureController, Ticker},
};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Detector passes spent at each pose by the scripted sweep.
const SWEEP_DWELL: usize = 15;
/// Yaw used by the scripted sweep for the side poses, in radians.
const SWEEP_SIDE_YAW: f32 = 0.35;

#[derive(Debug, Parser)]
#[command(name = "guided-capture", version, about = "Guided front/left/right face capture")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up after this many seconds.
    #[arg(short, long)]
    seconds: Option<u64>,

    /// Disable voice prompts.
    #[arg(long)]
    no_voice: bool,

    /// Serve Prometheus metrics on this port (requires the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if args.no_voice {
        config.feedback.voice_enabled = false;
    }
    if let Some(seconds) = args.seconds {
        config.output.session_seconds = seconds;
    }
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }

    info!("Guided Capture v{}", guided_capture::VERSION);

    let mut controller = LiveCaptureController::new(
        camera(),
        Box::new(ScriptedDetector::pose_sweep(SWEEP_DWELL, SWEEP_SIDE_YAW)),
        Box::new(TracingFeedback),
        &config,
    );

    match controller.start() {
        Ok(SourceStatus::PermissionDenied) => {
            eprintln!("Camera access denied. Enable it in your system settings and run again.");
            std::process::exit(2);
        }
        Ok(SourceStatus::Placeholder) => {
            info!("No camera hardware, running against the placeholder feed");
        }
        Ok(status) => info!(?status, "Camera running"),
        Err(e) => {
            eprintln!("Failed to start pipeline: {}", e);
            std::process::exit(1);
        }
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let (publish, end_metrics) = metrics_publisher(registry, config.output.metrics_port);

    let ticker = Ticker::new(config.session.tick_period());
    let cancel = ticker.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Release)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let deadline = Instant::now() + Duration::from_secs(config.output.session_seconds);
    let mut stills = Vec::new();

    let ticks = ticker.run(|| {
        let view = controller.tick();
        publish(&MetricsSnapshot::from_components(&controller.counters(), &view));

        if let Some(event) = view.auto_capture {
            info!(pose = %event.pose, count = event.count, "Auto capture");
        }

        if view.finish_enabled {
            controller.finish(|images| stills = images);
            return ControlFlow::Break(());
        }
        if Instant::now() >= deadline {
            warn!(captured = view.captured, "Session timed out");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });

    controller.stop();
    end_metrics();

    let counters = controller.counters();
    info!(
        "Ran {} ticks over {} frames ({} detector passes, {} dropped)",
        ticks, counters.frames_processed, counters.detector_runs, counters.detector_dropped
    );

    if stills.is_empty() {
        warn!("Session ended without completing");
        std::process::exit(1);
    }
    for (i, still) in stills.iter().enumerate() {
        println!(
            "capture {}: {}x{} frame #{} at {}",
            i + 1,
            still.width(),
            still.height(),
            still.sequence(),
            still.captured_at().to_rfc3339()
        );
    }
}

#[cfg(feature = "camera")]
fn camera() -> Box<dyn Camera> {
    Box::new(guided_capture::capture::NativeCamera::new())
}

#[cfg(not(feature = "camera"))]
fn camera() -> Box<dyn Camera> {
    Box::new(guided_capture::capture::SyntheticCamera::new())
}

/// Records one tick's snapshot.
type Publish = Box<dyn Fn(&MetricsSnapshot)>;
/// Marks the session as over once the tick loop has stopped.
type EndSession = Box<dyn FnOnce()>;

/// Returns the per-tick publisher and the teardown hook, serving the
/// registry over HTTP when enabled.
#[cfg(feature = "metrics")]
fn metrics_publisher(registry: MetricsRegistry, port: u16) -> (Publish, EndSession) {
    use guided_capture::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return (
            Box::new(move |snapshot: &MetricsSnapshot| registry.update(snapshot)),
            Box::new(|| {}),
        );
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();
    if let Err(e) = server.spawn() {
        warn!("Metrics server failed to start: {}", e);
    }
    let end_state = std::sync::Arc::clone(&state);
    (
        Box::new(move |snapshot: &MetricsSnapshot| state.blocking_write().update(snapshot)),
        Box::new(move || end_state.blocking_write().end_session()),
    )
}

#[cfg(not(feature = "metrics"))]
fn metrics_publisher(registry: MetricsRegistry, port: u16) -> (Publish, EndSession) {
    if port != 0 {
        warn!("Built without the `metrics` feature; port {} ignored", port);
    }
    (
        Box::new(move |snapshot: &MetricsSnapshot| registry.update(snapshot)),
        Box::new(|| {}),
    )
}
