use anyhow::Result;

use crate::detect::result::FrameDetections;

/// Source of per-frame detections.
///
/// # Contract
///
/// A source stands in for the capture + detection collaborator. It must:
/// - Deliver frames in capture order, one at a time
/// - Drop late frames rather than queue them
/// - Hand over detections by value (the evaluator never borrows source state)
pub trait DetectionSource: Send {
    /// Source identifier.
    fn name(&self) -> &str;

    /// Prepare the source. Called once before the first frame.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next frame of detections, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<FrameDetections>>;

    /// Number of frames delivered so far.
    fn frames_delivered(&self) -> u64;
}
