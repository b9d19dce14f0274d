// src/source.rs
//
// Tracking input. The engine does no detection or tracking itself; it
// consumes per-frame results produced by an external detector/tracker and
// trusts the track ids to be stable. The file-backed source replays a
// capture: one JSON record per line, and when the capture runs out it seeks
// back to the beginning and keeps going, so a running session never sees
// end-of-stream.

use crate::types::FrameObservations;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait TrackingSource {
    /// Deliver the next frame's tracking results. Blocks until available.
    /// A frame with no objects is valid. Exhaustion of a finite source is
    /// not an error: the source restarts from its beginning.
    fn next_frame(&mut self) -> Result<FrameObservations>;
}

/// Replays a JSONL tracking capture, looping forever.
///
/// Record shape:
/// `{"frame":1,"width":1280,"height":720,"objects":[{"id":42,"cx":320.0,"cy":180.0}]}`
pub struct CaptureFileSource {
    path: PathBuf,
    reader: BufReader<File>,
    /// Frames yielded since the last rewind. Zero at rewind time means the
    /// capture contains no parseable records and the loop must not spin.
    yielded_since_rewind: u64,
    passes: u64,
}

impl CaptureFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open capture {}", path.display()))?;
        if file.metadata()?.len() == 0 {
            bail!("Capture {} is empty", path.display());
        }
        info!("Opened tracking capture: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            yielded_since_rewind: 0,
            passes: 0,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        if self.yielded_since_rewind == 0 {
            bail!(
                "Capture {} yielded no parseable frames in a full pass",
                self.path.display()
            );
        }
        self.passes += 1;
        debug!(
            "Capture exhausted after {} frame(s), restarting from the beginning (pass {})",
            self.yielded_since_rewind, self.passes
        );
        self.yielded_since_rewind = 0;
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl TrackingSource for CaptureFileSource {
    fn next_frame(&mut self) -> Result<FrameObservations> {
        loop {
            let mut line = String::new();
            let bytes = self.reader.read_line(&mut line)?;
            if bytes == 0 {
                self.rewind()?;
                continue;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameObservations>(line) {
                Ok(obs) => {
                    self.yielded_since_rewind += 1;
                    return Ok(obs);
                }
                Err(e) => warn!("Skipping malformed capture line: {}", e),
            }
        }
    }
}

/// In-memory source for tests and embedding: replays a fixed frame list,
/// looping like the file source does.
pub struct ReplaySource {
    frames: Vec<FrameObservations>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(frames: Vec<FrameObservations>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl TrackingSource for ReplaySource {
    fn next_frame(&mut self) -> Result<FrameObservations> {
        if self.frames.is_empty() {
            bail!("Replay source has no frames");
        }
        let obs = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor += 1;
        Ok(obs)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_capture(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("zone_analytics_source_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reads_frames_in_order() {
        let path = write_capture(
            "ordered.jsonl",
            concat!(
                r#"{"frame":1,"width":100,"height":100,"objects":[{"id":1,"cx":10.0,"cy":10.0}]}"#,
                "\n",
                r#"{"frame":2,"width":100,"height":100,"objects":[]}"#,
                "\n",
            ),
        );
        let mut source = CaptureFileSource::open(&path).unwrap();
        assert_eq!(source.next_frame().unwrap().frame, 1);
        assert_eq!(source.next_frame().unwrap().frame, 2);
    }

    #[test]
    fn test_loops_back_to_start_on_exhaustion() {
        let path = write_capture(
            "looping.jsonl",
            concat!(r#"{"frame":7,"width":100,"height":100,"objects":[]}"#, "\n"),
        );
        let mut source = CaptureFileSource::open(&path).unwrap();
        assert_eq!(source.next_frame().unwrap().frame, 7);
        // Exhausted: restarts rather than erroring
        assert_eq!(source.next_frame().unwrap().frame, 7);
        assert_eq!(source.next_frame().unwrap().frame, 7);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let path = write_capture(
            "malformed.jsonl",
            concat!(
                "not json at all\n",
                r#"{"frame":3,"width":100,"height":100,"objects":[]}"#,
                "\n",
            ),
        );
        let mut source = CaptureFileSource::open(&path).unwrap();
        assert_eq!(source.next_frame().unwrap().frame, 3);
    }

    #[test]
    fn test_empty_capture_rejected() {
        let path = write_capture("empty.jsonl", "");
        assert!(CaptureFileSource::open(&path).is_err());
    }

    #[test]
    fn test_capture_with_no_parseable_frames_errors() {
        let path = write_capture("garbage.jsonl", "garbage\nmore garbage\n");
        let mut source = CaptureFileSource::open(&path).unwrap();
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn test_replay_source_loops() {
        let mut source = ReplaySource::new(vec![
            FrameObservations::empty(1, 100, 100),
            FrameObservations::empty(2, 100, 100),
        ]);
        assert_eq!(source.next_frame().unwrap().frame, 1);
        assert_eq!(source.next_frame().unwrap().frame, 2);
        assert_eq!(source.next_frame().unwrap().frame, 1);
    }
}
