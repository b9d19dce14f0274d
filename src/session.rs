// src/session.rs
//
// Session lifecycle and the one shared state object readers are allowed to
// see.
//
// One session owns every mutable analytics structure (heat grid, track
// table, bounded histories) and is the sole writer of the published
// snapshot. Readers only ever get an immutable, fully-formed snapshot: the
// complete result of frame N or frame N-1, never a mix. The manager makes
// the single-writer rule structural: starting a session first signals and
// joins any previous loop, so two writers can never race the shared state.

use crate::analytics::alerts;
use crate::analytics::heatmap::HeatAccumulator;
use crate::analytics::history::{ChartSeries, EventLog};
use crate::analytics::occupancy::{OccupancyTracker, ZoneAssignment};
use crate::metrics::SessionMetrics;
use crate::source::TrackingSource;
use crate::types::FrameObservations;
use crate::zones::ZoneRegistry;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// The analytics bundle published after every frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsSnapshot {
    /// Session-local frame counter (0 = nothing processed yet)
    pub frame: u64,
    pub zone_occupancy: HashMap<String, u32>,
    /// Newest first, at most 10
    pub events: Vec<String>,
    pub alerts: Vec<String>,
    /// Oldest first, at most 30 per zone
    pub chart_data: HashMap<String, Vec<u32>>,
}

/// Handle to the published snapshot. Clone freely; reads are cheap.
///
/// The writer swaps a whole `Arc<AnalyticsSnapshot>` under the write lock,
/// so a reader can never observe fields from two different frames.
#[derive(Clone)]
pub struct SharedAnalyticsState {
    inner: Arc<RwLock<Arc<AnalyticsSnapshot>>>,
}

impl SharedAnalyticsState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(AnalyticsSnapshot::default()))),
        }
    }

    pub fn snapshot(&self) -> Arc<AnalyticsSnapshot> {
        // A poisoned lock still holds a complete snapshot
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn publish(&self, snapshot: AnalyticsSnapshot) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(snapshot);
    }
}

/// Everything the render/transport collaborator gets per frame. The heat
/// grid is handed over before decay, so the values it sees are at full
/// frame-N intensity.
pub struct FrameUpdate<'a> {
    pub observations: &'a FrameObservations,
    pub heat: &'a HeatAccumulator,
    pub snapshot: &'a AnalyticsSnapshot,
    /// Transition events this frame, in submission order
    pub new_events: &'a [String],
}

pub trait FrameObserver: Send {
    fn on_frame(&mut self, update: &FrameUpdate<'_>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Running,
}

pub struct AnalyticsSession {
    registry: ZoneRegistry,
    occupancy: OccupancyTracker,
    heat: HeatAccumulator,
    events: EventLog,
    charts: ChartSeries,
    shared: SharedAnalyticsState,
    metrics: SessionMetrics,
    state: SessionState,
    frames_processed: u64,
}

impl AnalyticsSession {
    pub fn new(
        registry: ZoneRegistry,
        shared: SharedAnalyticsState,
        metrics: SessionMetrics,
    ) -> Self {
        let charts = ChartSeries::for_zones(registry.names());
        Self {
            registry,
            occupancy: OccupancyTracker::new(),
            heat: HeatAccumulator::new(),
            events: EventLog::new(),
            charts,
            shared,
            metrics,
            state: SessionState::Idle,
            frames_processed: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Reset every analytics structure and publish an empty snapshot, so
    /// readers of a restarted session never see the previous session's data.
    pub fn initialize(&mut self) {
        self.state = SessionState::Initializing;
        info!("Initializing session: {} zone(s)", self.registry.len());

        self.occupancy.reset();
        self.heat.reset();
        self.events.clear();
        self.charts = ChartSeries::for_zones(self.registry.names());
        self.frames_processed = 0;

        let snapshot = AnalyticsSnapshot {
            frame: 0,
            zone_occupancy: self.registry.names().map(|n| (n.to_string(), 0)).collect(),
            events: Vec::new(),
            alerts: Vec::new(),
            chart_data: self.charts.snapshot(),
        };
        self.shared.publish(snapshot);
    }

    /// One frame through the whole pipeline, in order: membership, heat,
    /// occupancy and events, alerts, chart points, snapshot publication,
    /// observer, decay. Decay runs last so the observer reads the grid at
    /// full intensity.
    pub fn process_frame(
        &mut self,
        observations: &FrameObservations,
        observer: Option<&mut dyn FrameObserver>,
    ) -> Result<()> {
        self.frames_processed += 1;
        self.heat
            .ensure_dimensions(observations.width, observations.height);

        let mut assignments = Vec::with_capacity(observations.objects.len());
        for object in &observations.objects {
            self.heat.stamp(object.cx, object.cy);
            let zone = self
                .registry
                .resolve(object.cx, object.cy, observations.width, observations.height)
                .map(str::to_string);
            assignments.push(ZoneAssignment {
                track_id: object.id,
                zone,
            });
        }

        let aggregate =
            self.occupancy
                .update(self.registry.names(), &assignments, &mut self.events);
        let alert_set = alerts::evaluate(self.registry.names(), &aggregate.occupancy);

        for (zone, count) in &aggregate.occupancy {
            self.charts.append(zone, *count);
        }

        let snapshot = AnalyticsSnapshot {
            frame: self.frames_processed,
            zone_occupancy: aggregate.occupancy,
            events: self.events.entries(),
            alerts: alert_set,
            chart_data: self.charts.snapshot(),
        };

        self.metrics.inc(&self.metrics.frames_processed);
        self.metrics
            .add(&self.metrics.objects_observed, observations.objects.len() as u64);
        self.metrics
            .add(&self.metrics.events_emitted, aggregate.new_events.len() as u64);
        self.metrics
            .set(&self.metrics.alerts_active, snapshot.alerts.len() as u64);

        self.shared.publish(snapshot.clone());

        if let Some(observer) = observer {
            let update = FrameUpdate {
                observations,
                heat: &self.heat,
                snapshot: &snapshot,
                new_events: &aggregate.new_events,
            };
            if let Err(e) = observer.on_frame(&update) {
                warn!("Frame observer failed on frame {}: {}", snapshot.frame, e);
            }
        }

        self.heat.decay();
        Ok(())
    }

    /// The frame loop. Sole writer of the shared state for as long as it
    /// runs; checks the cancellation flag once per frame so stopping is
    /// bounded by one source read.
    pub fn run(
        &mut self,
        source: &mut dyn TrackingSource,
        cancel: &AtomicBool,
        max_frames: u64,
        mut observer: Option<Box<dyn FrameObserver>>,
    ) {
        self.state = SessionState::Running;
        info!("Session running");

        loop {
            if cancel.load(Ordering::Relaxed) {
                info!("Session cancelled after {} frame(s)", self.frames_processed);
                break;
            }
            if max_frames > 0 && self.frames_processed >= max_frames {
                info!("Session reached frame limit ({})", max_frames);
                break;
            }

            match source.next_frame() {
                Ok(observations) => {
                    let observer_ref: Option<&mut dyn FrameObserver> = match &mut observer {
                        Some(o) => Some(o.as_mut()),
                        None => None,
                    };
                    if let Err(e) = self.process_frame(&observations, observer_ref) {
                        // Skip the update, keep the loop alive
                        warn!("Frame {} skipped: {}", self.frames_processed, e);
                    }
                }
                Err(e) => {
                    error!("Tracking source failed: {}", e);
                    break;
                }
            }

            if self.frames_processed % 300 == 0 && self.frames_processed > 0 {
                debug!(
                    "Progress: {} frames | {:.1} FPS | {} tracked id(s)",
                    self.frames_processed,
                    self.metrics.fps(),
                    self.occupancy.tracked_count()
                );
            }
        }

        self.state = SessionState::Idle;
    }
}

struct ActiveSession {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    metrics: SessionMetrics,
}

/// Owns the shared state and the at-most-one live session writing to it.
pub struct SessionManager {
    shared: SharedAnalyticsState,
    active: Option<ActiveSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            shared: SharedAnalyticsState::new(),
            active: None,
        }
    }

    pub fn shared(&self) -> SharedAnalyticsState {
        self.shared.clone()
    }

    pub fn metrics(&self) -> Option<SessionMetrics> {
        self.active.as_ref().map(|a| a.metrics.clone())
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| !a.handle.is_finished())
            .unwrap_or(false)
    }

    /// Start a session on a fresh source. Any previous session is signalled
    /// and joined first, so the new loop takes ownership of the shared state
    /// only after the old writer is gone.
    pub fn start(
        &mut self,
        registry: ZoneRegistry,
        mut source: Box<dyn TrackingSource + Send>,
        observer: Option<Box<dyn FrameObserver>>,
        max_frames: u64,
    ) -> Result<()> {
        self.stop();

        let metrics = SessionMetrics::new();
        let mut session =
            AnalyticsSession::new(registry, self.shared.clone(), metrics.clone());
        session.initialize();

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("analytics-session".to_string())
            .spawn(move || {
                session.run(source.as_mut(), &cancel_flag, max_frames, observer);
            })?;

        self.active = Some(ActiveSession {
            cancel,
            handle,
            metrics,
        });
        Ok(())
    }

    /// Signal the active session and wait for its loop to exit.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.store(true, Ordering::Relaxed);
            if active.handle.join().is_err() {
                error!("Session thread panicked");
            }
            info!("Session stopped");
        }
    }

    /// Block until the active session finishes on its own (frame limit or
    /// source failure).
    pub fn wait(&mut self) {
        if let Some(active) = self.active.take() {
            if active.handle.join().is_err() {
                error!("Session thread panicked");
            }
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// TESTS
// ============================================================================
