// src/metrics.rs
//
// Frame-loop observability. Counters are updated by the session writer and
// read from any thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub frames_processed: Arc<AtomicU64>,
    pub objects_observed: Arc<AtomicU64>,
    pub events_emitted: Arc<AtomicU64>,
    pub alerts_active: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            frames_processed: Arc::new(AtomicU64::new(0)),
            objects_observed: Arc::new(AtomicU64::new(0)),
            events_emitted: Arc::new(AtomicU64::new(0)),
            alerts_active: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn set(&self, counter: &AtomicU64, value: u64) {
        counter.store(value, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.frames_processed.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            objects_observed: self.objects_observed.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            alerts_active: self.alerts_active.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_processed: u64,
    pub objects_observed: u64,
    pub events_emitted: u64,
    pub alerts_active: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
