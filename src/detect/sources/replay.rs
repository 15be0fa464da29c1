//! JSON-lines replay source.
//!
//! Replays detector output recorded from a capture session. Each non-blank
//! line is one frame:
//!
//! ```text
//! {"width":1920,"height":1080,"brightness":3.2,"normalized":false,
//!  "objects":[{"label":"car","confidence":0.9,"x":460,"y":140,"width":1000,"height":800}]}
//! ```
//!
//! With `"normalized": true` box coordinates are 0..1 fractions of the frame
//! and are scaled to pixels on load.
//!
//! The replay source MUST NOT:
//! - Fetch remote URLs
//! - Reorder or batch frames

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::detect::result::{DetectedObject, FrameDetections};
use crate::detect::source::DetectionSource;
use crate::geometry::Rect;

#[derive(Debug, Deserialize)]
struct FrameRecord {
    width: u32,
    height: u32,
    #[serde(default)]
    brightness: Option<f64>,
    #[serde(default)]
    normalized: bool,
    #[serde(default)]
    objects: Vec<ObjectRecord>,
}

#[derive(Debug, Deserialize)]
struct ObjectRecord {
    label: String,
    #[serde(default)]
    confidence: f32,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FrameRecord {
    fn into_detections(self) -> Result<FrameDetections> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let (width, height, normalized) = (self.width, self.height, self.normalized);
        let objects = self
            .objects
            .into_iter()
            .map(|obj| {
                if obj.width < 0.0 || obj.height < 0.0 {
                    return Err(anyhow!("object '{}' has a negative size", obj.label));
                }
                let bounding_box = if normalized {
                    Rect::from_normalized(obj.x, obj.y, obj.width, obj.height, width, height)
                } else {
                    Rect::new(obj.x, obj.y, obj.width, obj.height)
                };
                Ok(DetectedObject::new(obj.label, bounding_box).with_confidence(obj.confidence))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FrameDetections {
            width,
            height,
            objects,
            brightness: self.brightness,
        })
    }
}

/// Parse a single replay line.
pub fn parse_frame_line(line: &str) -> Result<FrameDetections> {
    let record: FrameRecord = serde_json::from_str(line)?;
    record.into_detections()
}

pub struct ReplaySource {
    path: PathBuf,
    name: String,
    lines: Option<Lines<BufReader<File>>>,
    line_no: u64,
    frame_count: u64,
}

impl ReplaySource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = path.to_string_lossy();
        if raw.trim().is_empty() {
            return Err(anyhow!("replay path must not be empty"));
        }
        if raw.contains("://") {
            return Err(anyhow!(
                "replay only supports local paths (no URL schemes): {}",
                raw
            ));
        }
        Ok(Self {
            name: raw.to_string(),
            path,
            lines: None,
            line_no: 0,
            frame_count: 0,
        })
    }
}

impl DetectionSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening replay file {}", self.path.display()))?;
        self.lines = Some(BufReader::new(file).lines());
        self.line_no = 0;
        self.frame_count = 0;
        log::info!("ReplaySource: connected to {}", self.path.display());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<FrameDetections>> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| anyhow!("replay source {} is not connected", self.name))?;
        for line in lines.by_ref() {
            self.line_no += 1;
            let line = line
                .with_context(|| format!("reading {}:{}", self.path.display(), self.line_no))?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = parse_frame_line(&line)
                .with_context(|| format!("invalid frame at {}:{}", self.path.display(), self.line_no))?;
            self.frame_count += 1;
            return Ok(Some(frame));
        }
        Ok(None)
    }

    fn frames_delivered(&self) -> u64 {
        self.frame_count
    }
}
