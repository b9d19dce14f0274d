// src/analytics/heatmap.rs
//
// Decaying 2-D activity grid, one f32 cell per pixel.
//
// Per frame: every observed object center stamps a filled disc of value 1.0
// (overwrite, not additive, so overlapping stamps within a frame never push
// a cell past 1.0), then the whole grid is scaled by the decay factor once
// the render collaborator has consumed the current values. A cell stamped
// every frame reads 1.0 at render time; a cell stamped once fades below 0.1
// in about 45 frames (0.95^45 ~= 0.10). Stored values are raw; mapping them
// to a display range is the renderer's job.

use tracing::debug;

/// Stamp radius in pixels.
pub const HEAT_STAMP_RADIUS: i32 = 20;

/// Per-frame multiplicative decay.
pub const HEAT_DECAY: f32 = 0.95;

pub struct HeatAccumulator {
    cells: Vec<f32>,
    width: u32,
    height: u32,
}

impl HeatAccumulator {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// (Re)size to the frame resolution, zeroing all cells. Called lazily on
    /// the first frame and again whenever the source resolution changes.
    pub fn ensure_dimensions(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            debug!("Heat grid sized to {}x{}", width, height);
            self.width = width;
            self.height = height;
            self.cells = vec![0.0; (width as usize) * (height as usize)];
        }
    }

    pub fn reset(&mut self) {
        self.cells.fill(0.0);
    }

    /// Stamp a filled disc of 1.0 centered on a frame-space point, clipped
    /// at the grid edges.
    pub fn stamp(&mut self, cx: f32, cy: f32) {
        if self.cells.is_empty() {
            return;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        let (cx, cy) = (cx as i32, cy as i32);
        let r = HEAT_STAMP_RADIUS;

        for dy in -r..=r {
            let y = cy + dy;
            if y < 0 || y >= h {
                continue;
            }
            // Horizontal half-width of the disc at this row
            let span = ((r * r - dy * dy) as f32).sqrt() as i32;
            let x0 = (cx - span).max(0);
            let x1 = (cx + span).min(w - 1);
            if x0 > x1 {
                continue;
            }
            let row = (y as usize) * (self.width as usize);
            self.cells[row + x0 as usize..=row + x1 as usize].fill(1.0);
        }
    }

    /// Scale every cell by the decay factor. Called once per frame, after
    /// the render step has read the grid.
    pub fn decay(&mut self) {
        for cell in &mut self.cells {
            *cell *= HEAT_DECAY;
        }
    }

    pub fn value_at(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.cells[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

// ============================================================================
// TESTS
// ============================================================================
