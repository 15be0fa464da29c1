//! Renderer-facing view of a verdict.
//!
//! The evaluator never touches drawing state. A renderer builds an `Overlay`
//! from each verdict it receives and redraws from scratch: boxes for the
//! vehicle and every candidate, obstacle boxes highlighted, and at most one
//! banner per slot. Banners are warnings only; a well-framed, unobstructed
//! frame has none.

use serde::Serialize;

use crate::evaluator::Verdict;
use crate::geometry::Rect;

pub const OBSTACLE_BANNER: &str = "Obstacle Detected";
pub const LOW_LIGHT_BANNER: &str = "Too dark";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxKind {
    Vehicle,
    Candidate,
    Obstacle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayBox {
    pub kind: BoxKind,
    pub rect: Rect,
    pub text: String,
}

/// Where a banner sits on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerSlot {
    /// Bottom edge: framing guidance.
    Guidance,
    /// Just above guidance: obstacle alert.
    Alert,
    /// Top edge: lighting warning.
    Lighting,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Banner {
    pub slot: BannerSlot,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Overlay {
    pub boxes: Vec<OverlayBox>,
    pub banners: Vec<Banner>,
}

impl Overlay {
    pub fn banner(&self, slot: BannerSlot) -> Option<&Banner> {
        self.banners.iter().find(|b| b.slot == slot)
    }

    /// Same overlay with every box mapped into view coordinates.
    pub fn to_view(&self, transform: &ViewTransform) -> Overlay {
        Overlay {
            boxes: self
                .boxes
                .iter()
                .map(|b| OverlayBox {
                    rect: transform.apply(&b.rect),
                    ..b.clone()
                })
                .collect(),
            banners: self.banners.clone(),
        }
    }
}

fn box_text(label: &str, confidence: f32) -> String {
    format!("{}\nConfidence:  {:.2}", label, confidence)
}

/// Build the overlay for a verdict.
///
/// The vehicle box is only drawn once it passes the size gate.
pub fn build_overlay(verdict: &Verdict) -> Overlay {
    let mut boxes = Vec::with_capacity(verdict.candidates.len() + 1);

    if verdict.size_ok {
        if let Some(vehicle) = &verdict.vehicle {
            boxes.push(OverlayBox {
                kind: BoxKind::Vehicle,
                rect: vehicle.bounding_box,
                text: box_text(&vehicle.label, vehicle.confidence),
            });
        }
    }
    for candidate in &verdict.candidates {
        let is_obstacle = verdict
            .obstacles
            .iter()
            .any(|o| o.object == *candidate);
        boxes.push(OverlayBox {
            kind: if is_obstacle {
                BoxKind::Obstacle
            } else {
                BoxKind::Candidate
            },
            rect: candidate.bounding_box,
            text: box_text(&candidate.label, candidate.confidence),
        });
    }

    let mut banners = Vec::new();
    if let Some(message) = verdict.guidance_message() {
        banners.push(Banner {
            slot: BannerSlot::Guidance,
            text: message.to_string(),
        });
    }
    if verdict.obstacle_alert_active {
        banners.push(Banner {
            slot: BannerSlot::Alert,
            text: OBSTACLE_BANNER.to_string(),
        });
    }
    if verdict.low_light {
        banners.push(Banner {
            slot: BannerSlot::Lighting,
            text: LOW_LIGHT_BANNER.to_string(),
        });
    }

    Overlay { boxes, banners }
}

/// Maps frame coordinates onto a view: uniform aspect-fill scale, Y mirrored
/// (detector origin is bottom-left, views are top-left), frame centred.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub view_height: f64,
}

impl ViewTransform {
    pub fn fit(view_width: f64, view_height: f64, frame_width: f64, frame_height: f64) -> Self {
        let x_scale = view_width / frame_width;
        let y_scale = view_height / frame_height;
        let mut scale = x_scale.max(y_scale);
        if !scale.is_finite() || scale <= 0.0 {
            scale = 1.0;
        }
        Self {
            scale,
            offset_x: (view_width - frame_width * scale) / 2.0,
            offset_y: (view_height - frame_height * scale) / 2.0,
            view_height,
        }
    }

    pub fn apply(&self, rect: &Rect) -> Rect {
        let width = rect.width * self.scale;
        let height = rect.height * self.scale;
        let x = rect.x * self.scale + self.offset_x;
        let bottom = rect.y * self.scale + self.offset_y;
        Rect::new(x, self.view_height - bottom - height, width, height)
    }
}
