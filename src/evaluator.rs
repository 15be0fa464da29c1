//! Frame evaluation.
//!
//! Turns one frame of detections into a `Verdict`:
//!
//! 1. Pick the vehicle: the largest `car`/`truck` box. Everything else is an
//!    obstacle candidate.
//! 2. Size gate: vehicle height must sit inside the tolerance band.
//! 3. Position gate: vehicle centre must sit near the stencil centre.
//! 4. Obstacle check, only on well-framed frames: candidates intersecting the
//!    vehicle (and not dwarfing it) are obstacles.
//! 5. Debounce: the obstacle alert is raised after N consecutive obstacle
//!    frames and cleared by the first clean one.
//!
//! `evaluate_frame` is pure: the same input and prior state always produce the
//! same verdict and next state. `FrameEvaluator` owns the state for a capture
//! session; `evaluate` takes `&mut self`, so frames are serialized by
//! construction.

use serde::Serialize;

use crate::config::{EvaluatorConfig, FrameGeometry, Tolerances};
use crate::detect::{DetectedObject, FrameDetections};
use crate::geometry::Rect;

/// User-facing guidance shown while the vehicle is not framed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    FitVehicleInStencil,
    MoveRight,
    MoveLeft,
    MoveTop,
    MoveBottom,
}

impl Guidance {
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::FitVehicleInStencil => "Please Fit Vehicle In Stencil",
            Guidance::MoveRight => "Please move device right",
            Guidance::MoveLeft => "Please move device left",
            Guidance::MoveTop => "Please move device top",
            Guidance::MoveBottom => "Please move device bottom",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleReason {
    /// Candidate overlaps the vehicle box in `overlap`.
    IntersectsVehicle { overlap: Rect },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Obstacle {
    pub object: DetectedObject,
    pub reason: ObstacleReason,
}

/// Streak counters carried between frames of one capture session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationState {
    missing_vehicle_streak: u32,
    obstacle_present_streak: u32,
}

impl EvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive frames without any vehicle detection.
    pub fn missing_vehicle_streak(&self) -> u32 {
        self.missing_vehicle_streak
    }

    /// Consecutive well-framed frames with at least one obstacle.
    pub fn obstacle_present_streak(&self) -> u32 {
        self.obstacle_present_streak
    }
}

/// Outcome of one frame. Owned and immutable once built; renderers receive it
/// by value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
    /// Selected vehicle detection, if any.
    pub vehicle: Option<DetectedObject>,
    /// Vehicle box; `Rect::ZERO` when no vehicle was found.
    pub vehicle_box: Rect,
    pub size_ok: bool,
    pub position_ok: bool,
    pub vehicle_fits: bool,
    pub guidance: Option<Guidance>,
    pub obstacle_alert_active: bool,
    /// Obstacles found this frame. Empty when the obstacle check was skipped.
    pub obstacles: Vec<Obstacle>,
    /// Every non-vehicle detection, in detector order.
    pub candidates: Vec<DetectedObject>,
    pub obstacle_streak: u32,
    pub missing_vehicle_streak: u32,
    pub low_light: bool,
}

impl Verdict {
    pub fn guidance_message(&self) -> Option<&'static str> {
        self.guidance.map(|g| g.message())
    }
}

/// Index of the vehicle: largest-area `car`/`truck`, first one on ties.
pub fn select_vehicle(objects: &[DetectedObject]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, obj) in objects.iter().enumerate() {
        if !obj.is_vehicle() {
            continue;
        }
        let area = obj.bounding_box.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((idx, area)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Vehicle bounding box, or the empty box when there is no vehicle.
pub fn vehicle_box(objects: &[DetectedObject]) -> Rect {
    select_vehicle(objects)
        .map(|idx| objects[idx].bounding_box)
        .unwrap_or(Rect::ZERO)
}

/// Height within the inclusive tolerance band.
pub fn check_size(tolerances: &Tolerances, vehicle: &Rect) -> bool {
    vehicle.height >= tolerances.min_vehicle_height
        && vehicle.height <= tolerances.max_vehicle_height
}

pub fn size_guidance(size_ok: bool) -> Option<Guidance> {
    if size_ok {
        None
    } else {
        Some(Guidance::FitVehicleInStencil)
    }
}

/// Direction to move the device, or `None` when the vehicle is centred.
///
/// Checked in fixed priority order: right, left, top, bottom.
pub fn position_guidance(geometry: &FrameGeometry, vehicle: &Rect) -> Option<Guidance> {
    let (cx, cy) = geometry.center();
    let dx = vehicle.mid_x() - cx;
    let dy = vehicle.mid_y() - cy;
    let checks = [
        (dx > geometry.max_dx(), Guidance::MoveRight),
        (dx < -geometry.max_dx(), Guidance::MoveLeft),
        (dy > geometry.max_dy(), Guidance::MoveTop),
        (dy < -geometry.max_dy(), Guidance::MoveBottom),
    ];
    checks
        .into_iter()
        .find(|(failed, _)| *failed)
        .map(|(_, guidance)| guidance)
}

pub fn check_position(geometry: &FrameGeometry, vehicle: &Rect) -> bool {
    position_guidance(geometry, vehicle).is_none()
}

/// A candidate blocks the vehicle when it intersects the vehicle box and is
/// not larger than it (by `containment_ratio`) on both axes.
pub fn is_obstacle(candidate: &Rect, vehicle: &Rect, containment_ratio: f64) -> Option<Rect> {
    let overlap = candidate.intersection(vehicle)?;
    let contains_vehicle = candidate.width * containment_ratio > vehicle.width
        && candidate.height * containment_ratio > vehicle.height;
    if contains_vehicle {
        None
    } else {
        Some(overlap)
    }
}

/// Filter candidates down to obstacles, preserving order.
pub fn check_obstacles<'a, I>(
    candidates: I,
    vehicle: &Rect,
    containment_ratio: f64,
) -> (Vec<Obstacle>, bool)
where
    I: IntoIterator<Item = &'a DetectedObject>,
{
    let obstacles: Vec<Obstacle> = candidates
        .into_iter()
        .filter_map(|candidate| {
            is_obstacle(&candidate.bounding_box, vehicle, containment_ratio).map(|overlap| {
                Obstacle {
                    object: candidate.clone(),
                    reason: ObstacleReason::IntersectsVehicle { overlap },
                }
            })
        })
        .collect();
    let present = !obstacles.is_empty();
    (obstacles, present)
}

fn is_low_light(tolerances: &Tolerances, brightness: Option<f64>) -> bool {
    brightness
        .map(|value| value <= tolerances.min_brightness)
        .unwrap_or(false)
}

/// Evaluate one frame against the prior state.
///
/// The obstacle streak only moves on well-framed frames (size and position
/// both okay); on other frames it is carried over untouched.
pub fn evaluate_frame(
    config: &EvaluatorConfig,
    state: &EvaluationState,
    frame: &FrameDetections,
) -> (Verdict, EvaluationState) {
    let tolerances = config.tolerances();
    let mut next = *state;

    let vehicle_idx = select_vehicle(&frame.objects);
    let vehicle = vehicle_idx.map(|idx| frame.objects[idx].clone());
    let vehicle_box = vehicle
        .as_ref()
        .map(|v| v.bounding_box)
        .unwrap_or(Rect::ZERO);
    let candidates: Vec<DetectedObject> = frame
        .objects
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != vehicle_idx)
        .map(|(_, obj)| obj.clone())
        .collect();

    next.missing_vehicle_streak = if vehicle.is_some() {
        0
    } else {
        state.missing_vehicle_streak.saturating_add(1)
    };

    let size_ok = check_size(tolerances, &vehicle_box);
    let (position_ok, guidance) = if size_ok {
        let guidance = position_guidance(config.geometry(), &vehicle_box);
        (guidance.is_none(), guidance)
    } else {
        (false, size_guidance(size_ok))
    };
    let vehicle_fits = size_ok && position_ok;

    let obstacles = if vehicle_fits {
        let (obstacles, present) =
            check_obstacles(&candidates, &vehicle_box, tolerances.containment_ratio);
        next.obstacle_present_streak = if present {
            state.obstacle_present_streak.saturating_add(1)
        } else {
            0
        };
        obstacles
    } else {
        Vec::new()
    };

    let verdict = Verdict {
        vehicle,
        vehicle_box,
        size_ok,
        position_ok,
        vehicle_fits,
        guidance,
        obstacle_alert_active: next.obstacle_present_streak
            >= tolerances.obstacle_streak_threshold,
        obstacles,
        candidates,
        obstacle_streak: next.obstacle_present_streak,
        missing_vehicle_streak: next.missing_vehicle_streak,
        low_light: is_low_light(tolerances, frame.brightness),
    };
    (verdict, next)
}

/// Session-scoped evaluator. One instance per capture session.
pub struct FrameEvaluator {
    config: EvaluatorConfig,
    state: EvaluationState,
    alert_active: bool,
    frames_evaluated: u64,
}

impl FrameEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            state: EvaluationState::new(),
            alert_active: false,
            frames_evaluated: 0,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn frames_evaluated(&self) -> u64 {
        self.frames_evaluated
    }

    /// Evaluate the next frame of the session and advance the state.
    pub fn evaluate(&mut self, frame: &FrameDetections) -> Verdict {
        let (verdict, next) = evaluate_frame(&self.config, &self.state, frame);
        self.state = next;
        self.frames_evaluated += 1;

        if verdict.obstacle_alert_active != self.alert_active {
            if verdict.obstacle_alert_active {
                log::info!(
                    "obstacle alert raised at frame {} ({} obstacle(s))",
                    self.frames_evaluated,
                    verdict.obstacles.len()
                );
            } else {
                log::info!("obstacle alert cleared at frame {}", self.frames_evaluated);
            }
            self.alert_active = verdict.obstacle_alert_active;
        }
        log::debug!(
            "frame {}: fits={} guidance={:?} obstacles={} streak={}",
            self.frames_evaluated,
            verdict.vehicle_fits,
            verdict.guidance,
            verdict.obstacles.len(),
            verdict.obstacle_streak
        );
        verdict
    }

    /// Start a new capture session: both streaks return to zero.
    pub fn reset(&mut self) {
        self.state = EvaluationState::new();
        self.alert_active = false;
        self.frames_evaluated = 0;
    }
}
