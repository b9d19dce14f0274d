pub mod alerts;
pub mod heatmap;
pub mod history;
pub mod occupancy;
