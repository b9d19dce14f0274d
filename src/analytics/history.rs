// src/analytics/history.rs
//
// Bounded FIFO buffers backing the dashboard: a newest-first event log and
// one oldest-first occupancy series per zone. Both evict silently on
// overflow.

use std::collections::HashMap;
use std::collections::VecDeque;
use tracing::debug;

/// Narration entries shown on the dashboard, most recent first.
pub const EVENT_LOG_CAPACITY: usize = 10;

/// Per-zone occupancy samples kept for charting, oldest first.
pub const CHART_SERIES_CAPACITY: usize = 30;

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<String>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Insert at the newest-first end, dropping the oldest entry when full.
    pub fn record(&mut self, entry: String) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_back();
        }
        debug!("Event: {}", entry);
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    /// Series exist only for zones known at session start; samples for any
    /// other name are dropped in append().
    series: HashMap<String, VecDeque<u32>>,
}

impl ChartSeries {
    /// Create one empty series per zone name known at session start.
    pub fn for_zones<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        Self {
            series: names
                .map(|n| {
                    (
                        n.to_string(),
                        VecDeque::with_capacity(CHART_SERIES_CAPACITY),
                    )
                })
                .collect(),
        }
    }

    /// Append a sample at the newest end, dropping the oldest when full.
    /// Unknown zone names are silently ignored.
    pub fn append(&mut self, zone: &str, count: u32) {
        if let Some(points) = self.series.get_mut(zone) {
            if points.len() >= CHART_SERIES_CAPACITY {
                points.pop_front();
            }
            points.push_back(count);
        }
    }

    /// Oldest first, per zone.
    pub fn snapshot(&self) -> HashMap<String, Vec<u32>> {
        self.series
            .iter()
            .map(|(name, points)| (name.clone(), points.iter().copied().collect()))
            .collect()
    }

    pub fn get(&self, zone: &str) -> Option<Vec<u32>> {
        self.series.get(zone).map(|p| p.iter().copied().collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_newest_first() {
        let mut log = EventLog::new();
        log.record("first".to_string());
        log.record("second".to_string());
        assert_eq!(log.entries(), vec!["second", "first"]);
    }

    #[test]
    fn test_event_log_evicts_oldest() {
        let mut log = EventLog::new();
        for i in 0..15 {
            log.record(format!("event {}", i));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), EVENT_LOG_CAPACITY);
        assert_eq!(entries[0], "event 14");
        assert_eq!(entries[9], "event 5", "Oldest surviving entry is event 5");
    }

    #[test]
    fn test_chart_series_oldest_first() {
        let mut charts = ChartSeries::for_zones(["Lobby"].into_iter());
        charts.append("Lobby", 1);
        charts.append("Lobby", 2);
        charts.append("Lobby", 3);
        assert_eq!(charts.get("Lobby").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chart_series_evicts_oldest() {
        let mut charts = ChartSeries::for_zones(["Lobby"].into_iter());
        for i in 0..40u32 {
            charts.append("Lobby", i);
        }
        let points = charts.get("Lobby").unwrap();
        assert_eq!(points.len(), CHART_SERIES_CAPACITY);
        assert_eq!(points[0], 10);
        assert_eq!(points[29], 39);
    }

    #[test]
    fn test_unknown_zone_ignored() {
        let mut charts = ChartSeries::for_zones(["Lobby"].into_iter());
        charts.append("LateZone", 5);
        assert!(charts.get("LateZone").is_none());
        assert_eq!(charts.snapshot().len(), 1);
    }
}
