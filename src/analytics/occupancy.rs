// src/analytics/occupancy.rs
//
// Per-frame aggregation of object→zone assignments into zone→count, plus
// zone transition events per track across frames.
//
// Each track id carries one piece of state: the zone it was last seen in.
// The table is never pruned. A track that disappears keeps its last zone
// for the lifetime of the session, so a later reappearance of the same id
// resumes from where it left off.

use crate::analytics::history::EventLog;
use std::collections::HashMap;
use tracing::debug;

/// One object's membership result for the current frame.
#[derive(Debug, Clone)]
pub struct ZoneAssignment {
    pub track_id: i64,
    pub zone: Option<String>,
}

/// What one frame produced: counts per zone plus the transition events that
/// fired, in the order they were submitted to the log.
#[derive(Debug, Clone)]
pub struct FrameAggregate {
    pub occupancy: HashMap<String, u32>,
    pub new_events: Vec<String>,
}

pub struct OccupancyTracker {
    /// track id → last zone the track was resolved into (None = outside all
    /// zones). Grows without bound by design; see DESIGN.md.
    last_zone: HashMap<i64, Option<String>>,
}

impl OccupancyTracker {
    pub fn new() -> Self {
        Self {
            last_zone: HashMap::new(),
        }
    }

    /// Consume one frame's assignments. Produces the occupancy snapshot
    /// (every registry zone present, zeros included) and records transition
    /// events into the log.
    ///
    /// For a direct transition between two zones both events fire, "entered"
    /// submitted first. The log inserts newest-first, so the stored order
    /// places "left" ahead of "entered" for the same transition. Downstream
    /// consumers read the log in that order; keep it.
    pub fn update<'a>(
        &mut self,
        zone_names: impl Iterator<Item = &'a str>,
        assignments: &[ZoneAssignment],
        events: &mut EventLog,
    ) -> FrameAggregate {
        let mut occupancy: HashMap<String, u32> =
            zone_names.map(|n| (n.to_string(), 0)).collect();
        let mut new_events = Vec::new();

        for assignment in assignments {
            if let Some(zone) = &assignment.zone {
                if let Some(count) = occupancy.get_mut(zone) {
                    *count += 1;
                }
            }

            let previous = self
                .last_zone
                .get(&assignment.track_id)
                .cloned()
                .unwrap_or(None);

            if assignment.zone != previous {
                if let Some(zone) = &assignment.zone {
                    let entry = format!("ID {} entered '{}'", assignment.track_id, zone);
                    events.record(entry.clone());
                    new_events.push(entry);
                }
                if let Some(zone) = &previous {
                    let entry = format!("ID {} left '{}'", assignment.track_id, zone);
                    events.record(entry.clone());
                    new_events.push(entry);
                }
                debug!(
                    "Track {} zone change: {:?} -> {:?}",
                    assignment.track_id, previous, assignment.zone
                );
            }

            self.last_zone
                .insert(assignment.track_id, assignment.zone.clone());
        }

        FrameAggregate {
            occupancy,
            new_events,
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.last_zone.len()
    }

    pub fn reset(&mut self) {
        self.last_zone.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn in_zone(track_id: i64, zone: &str) -> ZoneAssignment {
        ZoneAssignment {
            track_id,
            zone: Some(zone.to_string()),
        }
    }

    fn outside(track_id: i64) -> ZoneAssignment {
        ZoneAssignment {
            track_id,
            zone: None,
        }
    }

    fn zone_names() -> impl Iterator<Item = &'static str> {
        ["Lobby", "Hall"].into_iter()
    }

    #[test]
    fn test_counts_include_empty_zones() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        let result = tracker.update(zone_names(), &[in_zone(1, "Lobby")], &mut log);
        assert_eq!(result.occupancy.get("Lobby"), Some(&1));
        assert_eq!(result.occupancy.get("Hall"), Some(&0));
    }

    #[test]
    fn test_empty_frame_is_valid() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        let result = tracker.update(zone_names(), &[], &mut log);
        assert_eq!(result.occupancy.values().sum::<u32>(), 0);
        assert!(result.new_events.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_first_sighting_in_zone_emits_entered_only() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        assert_eq!(log.entries(), vec!["ID 42 entered 'Lobby'"]);
    }

    #[test]
    fn test_first_sighting_outside_emits_nothing() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[outside(42)], &mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn test_unchanged_zone_emits_nothing() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_direct_transition_stores_left_ahead_of_entered() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        let result = tracker.update(zone_names(), &[in_zone(42, "Hall")], &mut log);
        // Submission order is entered-then-left...
        assert_eq!(
            result.new_events,
            vec!["ID 42 entered 'Hall'", "ID 42 left 'Lobby'"]
        );
        // ...which the newest-first log stores as left-ahead-of-entered
        assert_eq!(
            log.entries(),
            vec![
                "ID 42 left 'Lobby'",
                "ID 42 entered 'Hall'",
                "ID 42 entered 'Lobby'",
            ],
            "The stored order for a transition is left-ahead-of-entered"
        );
    }

    #[test]
    fn test_exit_to_nowhere_emits_left_only() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        tracker.update(zone_names(), &[outside(42)], &mut log);
        assert_eq!(log.entries()[0], "ID 42 left 'Lobby'");
    }

    #[test]
    fn test_unobserved_track_retains_state() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        // Track 42 vanishes for a frame
        tracker.update(zone_names(), &[], &mut log);
        assert_eq!(tracker.tracked_count(), 1);
        // Reappears in the same zone: no new events
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_occupancy_sum_bounded_by_observed_objects() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        let assignments = vec![
            in_zone(1, "Lobby"),
            in_zone(2, "Hall"),
            outside(3),
            in_zone(4, "Hall"),
        ];
        let result = tracker.update(zone_names(), &assignments, &mut log);
        assert!(result.occupancy.values().sum::<u32>() <= assignments.len() as u32);
        assert_eq!(result.occupancy.get("Hall"), Some(&2));
    }

    #[test]
    fn test_reset_clears_zone_memory() {
        let mut tracker = OccupancyTracker::new();
        let mut log = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log);
        tracker.reset();
        assert_eq!(tracker.tracked_count(), 0);
        // After reset the same sighting is a fresh entry event
        let mut log2 = EventLog::new();
        tracker.update(zone_names(), &[in_zone(42, "Lobby")], &mut log2);
        assert_eq!(log2.len(), 1);
    }
}
