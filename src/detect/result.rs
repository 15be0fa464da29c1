use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Detector class names treated as the vehicle to frame.
pub const VEHICLE_LABELS: &[&str] = &["car", "truck"];

/// Returns true for labels that identify a vehicle.
pub fn is_vehicle_label(label: &str) -> bool {
    VEHICLE_LABELS.contains(&label)
}

/// One labelled detection, in frame pixel coordinates.
///
/// Only the top label of the detector's observation is carried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub bounding_box: Rect,
    /// Detector confidence for the label. Shown on overlays; not used for gating.
    #[serde(default)]
    pub confidence: f32,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, bounding_box: Rect) -> Self {
        Self {
            label: label.into(),
            bounding_box,
            confidence: 0.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_vehicle(&self) -> bool {
        is_vehicle_label(&self.label)
    }
}

/// Everything the detector delivers for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    /// Frame pixel dimensions.
    pub width: u32,
    pub height: u32,
    pub objects: Vec<DetectedObject>,
    /// Exposure brightness reported by the capture layer, when available.
    #[serde(default)]
    pub brightness: Option<f64>,
}

impl FrameDetections {
    pub fn new(width: u32, height: u32, objects: Vec<DetectedObject>) -> Self {
        Self {
            width,
            height,
            objects,
            brightness: None,
        }
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = Some(brightness);
        self
    }
}
