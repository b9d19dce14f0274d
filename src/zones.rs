// src/zones.rs
//
// Zone registry and point-in-zone membership resolution.
//
// Zones are named rectangles with coordinates normalized to [0,1] relative
// to frame width/height, loaded once from the zone store when a session
// starts and immutable afterwards. Membership is first-match-wins in
// registry order, so an object inside overlapping zones is attributed only
// to the earliest-registered one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCoords {
    #[serde(default)]
    pub top_left: Option<NormPoint>,
    #[serde(default)]
    pub bottom_right: Option<NormPoint>,
}

/// One row of the zone store file, as persisted by the zone editor.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    pub label: String,
    #[serde(default)]
    pub coordinates: Option<ZoneCoords>,
}

/// A zone that survived validation: both corners present.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub top_left: NormPoint,
    pub bottom_right: NormPoint,
}

impl Zone {
    pub fn new(name: &str, tl: (f32, f32), br: (f32, f32)) -> Self {
        Self {
            name: name.to_string(),
            top_left: NormPoint { x: tl.0, y: tl.1 },
            bottom_right: NormPoint { x: br.0, y: br.1 },
        }
    }

    /// Strict containment test against a frame-space center point.
    /// Points exactly on a zone edge belong to no zone.
    fn contains(&self, cx: f32, cy: f32, frame_w: f32, frame_h: f32) -> bool {
        let tl_x = self.top_left.x * frame_w;
        let tl_y = self.top_left.y * frame_h;
        let br_x = self.bottom_right.x * frame_w;
        let br_y = self.bottom_right.y * frame_h;
        tl_x < cx && cx < br_x && tl_y < cy && cy < br_y
    }
}

/// Ordered, immutable-per-session set of zones. File order is load-bearing:
/// it defines the first-match tie-break for overlapping zones.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Load the registry from the zone store. Records with missing or null
    /// coordinates are excluded, not fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read zone store {}", path.display()))?;
        let records: Vec<ZoneRecord> =
            serde_json::from_str(&contents).context("Failed to parse zone store")?;

        let total = records.len();
        let mut zones = Vec::with_capacity(total);
        for record in records {
            match record.coordinates {
                Some(ZoneCoords {
                    top_left: Some(tl),
                    bottom_right: Some(br),
                }) => zones.push(Zone {
                    name: record.label,
                    top_left: tl,
                    bottom_right: br,
                }),
                _ => warn!("Zone '{}' has incomplete coordinates, skipping", record.label),
            }
        }

        info!("Loaded {} zone(s) from store ({} records)", zones.len(), total);
        Ok(Self { zones })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Resolve which zone contains a frame-space center point. Returns the
    /// first matching zone in registry order, or None.
    pub fn resolve(&self, cx: f32, cy: f32, frame_w: u32, frame_h: u32) -> Option<&str> {
        let (fw, fh) = (frame_w as f32, frame_h as f32);
        self.zones
            .iter()
            .find(|z| z.contains(cx, cy, fw, fh))
            .map(|z| z.name.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
