// src/analytics/alerts.rs
//
// Threshold sweep over the current occupancy snapshot. The alert set is
// recomputed from scratch every frame (no hysteresis, no debounce), so a
// zone can alert and clear on successive frames.

use std::collections::HashMap;

/// A zone alerts when its occupancy strictly exceeds this.
pub const ALERT_THRESHOLD: u32 = 7;

/// Produce the alert set for one frame, sweeping zones in registry order so
/// the output is deterministic. Fully replaces the previous set.
pub fn evaluate<'a>(
    zone_names: impl Iterator<Item = &'a str>,
    occupancy: &HashMap<String, u32>,
) -> Vec<String> {
    zone_names
        .filter_map(|name| {
            let count = occupancy.get(name).copied().unwrap_or(0);
            (count > ALERT_THRESHOLD).then(|| {
                format!(
                    "zone {} exceeded threshold ({}/{})",
                    name, count, ALERT_THRESHOLD
                )
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn occupancy(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_alert_fires_strictly_above_threshold() {
        let occ = occupancy(&[("Lobby", 7), ("Hall", 8)]);
        let alerts = evaluate(["Lobby", "Hall"].into_iter(), &occ);
        assert_eq!(alerts, vec!["zone Hall exceeded threshold (8/7)"]);
    }

    #[test]
    fn test_no_alerts_at_or_below_threshold() {
        let occ = occupancy(&[("Lobby", 0), ("Hall", 7)]);
        assert!(evaluate(["Lobby", "Hall"].into_iter(), &occ).is_empty());
    }

    #[test]
    fn test_alerts_follow_registry_order() {
        let occ = occupancy(&[("Lobby", 9), ("Hall", 12)]);
        let alerts = evaluate(["Lobby", "Hall"].into_iter(), &occ);
        assert_eq!(
            alerts,
            vec![
                "zone Lobby exceeded threshold (9/7)",
                "zone Hall exceeded threshold (12/7)",
            ]
        );
    }

    #[test]
    fn test_alert_set_fully_replaced() {
        let alerts = evaluate(["Hall"].into_iter(), &occupancy(&[("Hall", 8)]));
        assert_eq!(alerts.len(), 1);
        // Next frame the count drops; the previous alert must not linger
        let alerts = evaluate(["Hall"].into_iter(), &occupancy(&[("Hall", 0)]));
        assert!(alerts.is_empty());
    }
}
