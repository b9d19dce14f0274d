use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub zones: ZonesConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_dir: String,
    /// 0 = run until the session is cancelled
    #[serde(default)]
    pub max_frames: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonesConfig {
    pub store_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    #[serde(default = "default_save_events")]
    pub save_events: bool,
}

fn default_save_events() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One tracked object reported by the external detector/tracker for a frame.
/// The track id is assigned upstream and assumed stable across frames for
/// one physical entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: i64,
    /// Bounding-box center, frame pixel space
    pub cx: f32,
    pub cy: f32,
}

/// Everything the tracking source delivers for a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameObservations {
    pub frame: u64,
    pub width: u32,
    pub height: u32,
    pub objects: Vec<TrackedObject>,
}

impl FrameObservations {
    pub fn empty(frame: u64, width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
            objects: Vec::new(),
        }
    }
}
