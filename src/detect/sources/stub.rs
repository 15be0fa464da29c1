//! Synthetic detection source (`stub://<scenario>`).
//!
//! Produces scripted detections for demos and tests without a camera or
//! model. Box positions get a small seeded jitter so consecutive frames are
//! not byte-identical, which is closer to what a real detector emits.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::result::{DetectedObject, FrameDetections};
use crate::detect::source::DetectionSource;
use crate::geometry::Rect;

const DEFAULT_FRAMES: u64 = 120;
const DEFAULT_JITTER_PX: f64 = 4.0;
const VEHICLE_WIDTH: f64 = 1000.0;
const VEHICLE_HEIGHT: f64 = 800.0;
const DRIFT_PX_PER_FRAME: f64 = 20.0;
const DAYLIGHT_BRIGHTNESS: f64 = 4.5;
const DUSK_BRIGHTNESS: f64 = 1.2;

/// Scripted scene played by the stub source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Vehicle centred in the stencil, nothing else in view.
    Centered,
    /// Centred vehicle with a person standing in front of it.
    Obstructed,
    /// Vehicle sliding to the right by a fixed step each frame.
    Drifting,
    /// Centred vehicle in low light.
    Dusk,
    /// No detections at all.
    Empty,
}

impl Scenario {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "centered" => Ok(Self::Centered),
            "obstructed" => Ok(Self::Obstructed),
            "drifting" => Ok(Self::Drifting),
            "dusk" => Ok(Self::Dusk),
            "empty" => Ok(Self::Empty),
            other => Err(anyhow!(
                "unknown stub scenario '{}' (expected centered, obstructed, drifting, dusk or empty)",
                other
            )),
        }
    }
}

/// Configuration for a stub source.
#[derive(Clone, Debug)]
pub struct StubConfig {
    pub scenario: Scenario,
    pub width: u32,
    pub height: u32,
    /// Number of frames before the source reports exhaustion.
    pub frames: u64,
    /// Maximum absolute jitter applied to each box origin, in pixels.
    pub jitter_px: f64,
    pub seed: u64,
}

impl StubConfig {
    pub fn new(scenario: Scenario, width: u32, height: u32) -> Self {
        Self {
            scenario,
            width,
            height,
            frames: DEFAULT_FRAMES,
            jitter_px: DEFAULT_JITTER_PX,
            seed: 0,
        }
    }
}

pub struct StubSource {
    name: String,
    config: StubConfig,
    rng: StdRng,
    frame_count: u64,
}

impl StubSource {
    pub fn new(config: StubConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("stub source dimensions must be non-zero"));
        }
        if !config.jitter_px.is_finite() || config.jitter_px < 0.0 {
            return Err(anyhow!("stub jitter must be a non-negative number of pixels"));
        }
        Ok(Self {
            name: format!("stub://{:?}", config.scenario).to_lowercase(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            frame_count: 0,
        })
    }

    fn jitter(&mut self) -> f64 {
        let j = self.config.jitter_px;
        self.rng.gen_range(-j..=j)
    }

    fn vehicle(&mut self, offset_x: f64) -> DetectedObject {
        let cx = self.config.width as f64 / 2.0 + offset_x + self.jitter();
        let cy = self.config.height as f64 / 2.0 + self.jitter();
        DetectedObject::new(
            "car",
            Rect::centered_at(cx, cy, VEHICLE_WIDTH, VEHICLE_HEIGHT),
        )
        .with_confidence(0.92)
    }

    fn pedestrian(&mut self) -> DetectedObject {
        let cx = self.config.width as f64 / 2.0 + 150.0 + self.jitter();
        let cy = self.config.height as f64 / 2.0 + self.jitter();
        DetectedObject::new("person", Rect::centered_at(cx, cy, 300.0, 600.0)).with_confidence(0.81)
    }

    fn build_frame(&mut self) -> FrameDetections {
        let (objects, brightness) = match self.config.scenario {
            Scenario::Centered => (vec![self.vehicle(0.0)], DAYLIGHT_BRIGHTNESS),
            Scenario::Obstructed => {
                let vehicle = self.vehicle(0.0);
                (vec![vehicle, self.pedestrian()], DAYLIGHT_BRIGHTNESS)
            }
            Scenario::Drifting => {
                let offset = (self.frame_count - 1) as f64 * DRIFT_PX_PER_FRAME;
                (vec![self.vehicle(offset)], DAYLIGHT_BRIGHTNESS)
            }
            Scenario::Dusk => (vec![self.vehicle(0.0)], DUSK_BRIGHTNESS),
            Scenario::Empty => (vec![], DAYLIGHT_BRIGHTNESS),
        };
        FrameDetections::new(self.config.width, self.config.height, objects)
            .with_brightness(brightness)
    }
}

impl DetectionSource for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "StubSource: playing {:?} for {} frames ({}x{})",
            self.config.scenario,
            self.config.frames,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<FrameDetections>> {
        if self.frame_count >= self.config.frames {
            return Ok(None);
        }
        self.frame_count += 1;
        Ok(Some(self.build_frame()))
    }

    fn frames_delivered(&self) -> u64 {
        self.frame_count
    }
}
