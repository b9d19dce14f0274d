// src/main.rs

mod analytics;
mod config;
mod metrics;
mod session;
mod source;
mod types;
mod zones;

use anyhow::{Context, Result};
use session::{FrameObserver, FrameUpdate, SessionManager};
use source::CaptureFileSource;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use types::Config;
use walkdir::WalkDir;
use zones::ZoneRegistry;

fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .init();

    info!("📡 Zone Occupancy Analytics starting");

    let registry = ZoneRegistry::load(Path::new(&config.zones.store_path))?;
    if registry.is_empty() {
        warn!("Zone store has no usable zones, occupancy will always be empty");
    }

    let captures = find_capture_files(&config.source.input_dir)?;
    if captures.is_empty() {
        error!("No tracking captures found in {}", config.source.input_dir);
        return Ok(());
    }
    info!("Found {} tracking capture(s)", captures.len());

    if captures.len() > 1 && config.source.max_frames == 0 {
        warn!("max_frames is 0, only the first capture will run (indefinitely)");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Failed to install interrupt handler")?;
    }

    let mut manager = SessionManager::new();

    for (idx, capture) in captures.iter().enumerate() {
        info!(
            "Processing capture {}/{}: {}",
            idx + 1,
            captures.len(),
            capture.display()
        );

        if let Err(e) = process_capture(&mut manager, &config, &registry, capture, &shutdown) {
            error!("Failed to process capture: {}", e);
        }

        if shutdown.load(Ordering::Relaxed) {
            info!("Interrupted, skipping remaining captures");
            break;
        }
    }

    Ok(())
}

fn process_capture(
    manager: &mut SessionManager,
    config: &Config,
    registry: &ZoneRegistry,
    capture: &Path,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    let source = Box::new(CaptureFileSource::open(capture)?);

    let observer: Option<Box<dyn FrameObserver>> = if config.output.save_events {
        let writer = JsonlEventWriter::create(&config.output.dir, capture)?;
        Some(Box::new(writer))
    } else {
        None
    };

    manager.start(
        registry.clone(),
        source,
        observer,
        config.source.max_frames,
    )?;

    let metrics = manager
        .metrics()
        .context("Session metrics missing after start")?;

    // Dashboard poller: a concurrent reader of the published snapshot,
    // exactly the role the status endpoints played upstream.
    let poll_stop = Arc::new(AtomicBool::new(false));
    let poller = {
        let shared = manager.shared();
        let stop = poll_stop.clone();
        std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                std::thread::sleep(std::time::Duration::from_secs(1));
                let snap = shared.snapshot();
                if snap.frame == 0 {
                    continue;
                }
                let mut pairs: Vec<_> = snap
                    .zone_occupancy
                    .iter()
                    .map(|(name, count)| format!("{}={}", name, count))
                    .collect();
                pairs.sort();
                info!(
                    "📊 frame {} | occupancy: {} | alerts: {} | latest: {}",
                    snap.frame,
                    pairs.join(" "),
                    snap.alerts.len(),
                    snap.events.first().map(String::as_str).unwrap_or("-")
                );
                for alert in &snap.alerts {
                    warn!("🚨 {}", alert);
                }
            }
        })
    };

    while manager.is_running() && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if shutdown.load(Ordering::Relaxed) {
        info!("⏹ Interrupt received, stopping session");
    }
    manager.stop();
    poll_stop.store(true, Ordering::Relaxed);
    let _ = poller.join();

    let summary = metrics.summary();
    let snap = manager.shared().snapshot();
    info!("📊 Final Report:");
    info!("  Frames processed: {}", summary.frames_processed);
    info!("  Objects observed: {}", summary.objects_observed);
    info!("  Events emitted: {}", summary.events_emitted);
    info!("  Alerts active at end: {}", summary.alerts_active);
    for event in &snap.events {
        info!("  🕘 {}", event);
    }
    info!("  Processing Speed: {:.1} FPS", summary.fps);

    Ok(())
}

fn find_capture_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut captures = Vec::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
            captures.push(path.to_path_buf());
        }
    }

    captures.sort();
    Ok(captures)
}

/// Appends transition events to `{output.dir}/{capture}_events.jsonl`, one
/// JSON object per line.
struct JsonlEventWriter {
    file: std::fs::File,
}

impl JsonlEventWriter {
    fn create(output_dir: &str, capture: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        let stem = capture
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("capture");
        let path = Path::new(output_dir).join(format!("{}_events.jsonl", stem));
        info!("💾 Events will be written to: {}", path.display());
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { file })
    }
}

impl FrameObserver for JsonlEventWriter {
    fn on_frame(&mut self, update: &FrameUpdate<'_>) -> Result<()> {
        if update.new_events.is_empty() {
            return Ok(());
        }
        for event in update.new_events {
            let line = serde_json::json!({
                "frame": update.snapshot.frame,
                "event": event,
            });
            writeln!(self.file, "{}", line)?;
        }
        self.file.flush()?;
        Ok(())
    }
}
