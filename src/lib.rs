//! Stencil Guard
//!
//! Decision engine for stencil-guided vehicle capture: given one frame of
//! detections from an external object detector, decide whether the vehicle
//! fits the on-screen stencil, what the user should do if it doesn't, and
//! whether something is standing in the way.
//!
//! # Architecture
//!
//! The engine sits between two collaborators it does not own:
//!
//! 1. **Capture + detection** deliver `FrameDetections` (labelled boxes,
//!    frame size, optional exposure brightness) once per frame.
//! 2. **Rendering** receives an owned `Verdict` per frame and redraws from it.
//!
//! In between, the evaluator is a pure function of (frame, prior streak
//! state). The only state that outlives a frame is two streak counters, reset
//! at session start.
//!
//! # Module Structure
//!
//! - `geometry`: `Rect` and box arithmetic
//! - `detect`: input contract and detection sources (stub scenarios, JSON-lines replay)
//! - `config`: frame geometry, tolerances, file/env loading
//! - `evaluator`: vehicle selection, size/position gates, obstacle debounce
//! - `overlay`: renderer-facing boxes and banners
//! - `ui`: terminal feedback for the replay tool

pub mod config;
pub mod detect;
pub mod evaluator;
pub mod geometry;
pub mod overlay;
pub mod ui;

pub use config::{EvaluatorConfig, FrameGeometry, StencilConfig, Tolerances};
pub use detect::{open_source, DetectedObject, DetectionSource, FrameDetections};
pub use evaluator::{
    check_obstacles, check_position, check_size, evaluate_frame, select_vehicle, vehicle_box,
    EvaluationState, FrameEvaluator, Guidance, Obstacle, ObstacleReason, Verdict,
};
pub use geometry::Rect;
pub use overlay::{build_overlay, Overlay, ViewTransform};
