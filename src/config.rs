use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_FRAME_WIDTH: f64 = 1920.0;
const DEFAULT_FRAME_HEIGHT: f64 = 1080.0;
const DEFAULT_MAX_DX: f64 = 300.0;
const DEFAULT_MAX_DY: f64 = 200.0;
const DEFAULT_SOURCE: &str = "stub://centered";

pub const DEFAULT_MIN_VEHICLE_HEIGHT: f64 = 700.0;
pub const DEFAULT_MAX_VEHICLE_HEIGHT: f64 = 1100.0;
pub const DEFAULT_OBSTACLE_STREAK_THRESHOLD: u32 = 10;
pub const DEFAULT_CONTAINMENT_RATIO: f64 = 0.8;
pub const DEFAULT_MIN_BRIGHTNESS: f64 = 2.0;

/// Frame size and the allowed offset of the vehicle centre from the stencil
/// centre. Constant for a capture session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameGeometry {
    frame_width: f64,
    frame_height: f64,
    max_dx: f64,
    max_dy: f64,
}

impl FrameGeometry {
    pub fn new(frame_width: f64, frame_height: f64, max_dx: f64, max_dy: f64) -> Result<Self> {
        if !(frame_width.is_finite() && frame_width > 0.0) {
            return Err(anyhow!("frame width must be positive, got {}", frame_width));
        }
        if !(frame_height.is_finite() && frame_height > 0.0) {
            return Err(anyhow!("frame height must be positive, got {}", frame_height));
        }
        if !(max_dx.is_finite() && max_dx >= 0.0) {
            return Err(anyhow!("max_dx must be a non-negative number, got {}", max_dx));
        }
        if !(max_dy.is_finite() && max_dy >= 0.0) {
            return Err(anyhow!("max_dy must be a non-negative number, got {}", max_dy));
        }
        Ok(Self {
            frame_width,
            frame_height,
            max_dx,
            max_dy,
        })
    }

    pub fn frame_width(&self) -> f64 {
        self.frame_width
    }

    pub fn frame_height(&self) -> f64 {
        self.frame_height
    }

    pub fn max_dx(&self) -> f64 {
        self.max_dx
    }

    pub fn max_dy(&self) -> f64 {
        self.max_dy
    }

    /// Stencil centre in frame coordinates.
    pub fn center(&self) -> (f64, f64) {
        (self.frame_width / 2.0, self.frame_height / 2.0)
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            max_dx: DEFAULT_MAX_DX,
            max_dy: DEFAULT_MAX_DY,
        }
    }
}

/// Integration-time thresholds for the evaluator.
/// Unknown keys are rejected so a misspelt threshold cannot silently fall
/// back to its default.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tolerances {
    /// Inclusive vehicle height band, in pixels.
    pub min_vehicle_height: f64,
    pub max_vehicle_height: f64,
    /// Consecutive obstacle frames before the alert is raised.
    pub obstacle_streak_threshold: u32,
    /// A candidate larger than the vehicle by this factor on both axes is
    /// treated as background, not an obstacle. Heuristic; tune per stencil.
    pub containment_ratio: f64,
    /// Brightness at or below this value is reported as low light.
    pub min_brightness: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            min_vehicle_height: DEFAULT_MIN_VEHICLE_HEIGHT,
            max_vehicle_height: DEFAULT_MAX_VEHICLE_HEIGHT,
            obstacle_streak_threshold: DEFAULT_OBSTACLE_STREAK_THRESHOLD,
            containment_ratio: DEFAULT_CONTAINMENT_RATIO,
            min_brightness: DEFAULT_MIN_BRIGHTNESS,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> Result<()> {
        // A zero lower bound would let an empty (missing) vehicle box pass.
        if !(self.min_vehicle_height.is_finite() && self.min_vehicle_height > 0.0) {
            return Err(anyhow!("min_vehicle_height must be positive"));
        }
        if !self.max_vehicle_height.is_finite()
            || self.max_vehicle_height < self.min_vehicle_height
        {
            return Err(anyhow!(
                "vehicle height band is empty: [{}, {}]",
                self.min_vehicle_height,
                self.max_vehicle_height
            ));
        }
        if self.obstacle_streak_threshold == 0 {
            return Err(anyhow!("obstacle_streak_threshold must be at least 1"));
        }
        if !(self.containment_ratio.is_finite() && self.containment_ratio > 0.0) {
            return Err(anyhow!("containment_ratio must be positive"));
        }
        if !self.min_brightness.is_finite() {
            return Err(anyhow!("min_brightness must be a finite number"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StencilConfigFile {
    source: Option<String>,
    frame: Option<FrameConfigFile>,
    tolerances: Option<Tolerances>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FrameConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    max_dx: Option<f64>,
    max_dy: Option<f64>,
}

/// Validated evaluator configuration for one capture session.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfig {
    geometry: FrameGeometry,
    tolerances: Tolerances,
}

impl EvaluatorConfig {
    pub fn new(geometry: FrameGeometry, tolerances: Tolerances) -> Result<Self> {
        tolerances.validate()?;
        Ok(Self {
            geometry,
            tolerances,
        })
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }
}

/// Full configuration for the replay tool: detection source + evaluator.
#[derive(Debug, Clone)]
pub struct StencilConfig {
    pub source: String,
    pub evaluator: EvaluatorConfig,
}

/// Raw values before validation; env overrides land here.
struct PendingConfig {
    source: String,
    width: f64,
    height: f64,
    max_dx: f64,
    max_dy: f64,
    tolerances: Tolerances,
}

impl StencilConfig {
    /// Load from the file named by `STENCIL_CONFIG` (if any), then apply env
    /// overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STENCIL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        Self::build(file_cfg.unwrap_or_default())
    }

    /// Load from an explicit file, then apply env overrides and validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(read_config_file(path.as_ref())?)
    }

    fn build(file: StencilConfigFile) -> Result<Self> {
        let mut pending = PendingConfig::from_file(file);
        pending.apply_env()?;
        pending.validate()
    }
}

impl PendingConfig {
    fn from_file(file: StencilConfigFile) -> Self {
        let frame = file.frame.unwrap_or_default();
        Self {
            source: file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            width: frame.width.unwrap_or(DEFAULT_FRAME_WIDTH),
            height: frame.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
            max_dx: frame.max_dx.unwrap_or(DEFAULT_MAX_DX),
            max_dy: frame.max_dy.unwrap_or(DEFAULT_MAX_DY),
            tolerances: file.tolerances.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("STENCIL_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Some(width) = env_number("STENCIL_FRAME_WIDTH")? {
            self.width = width;
        }
        if let Some(height) = env_number("STENCIL_FRAME_HEIGHT")? {
            self.height = height;
        }
        if let Some(max_dx) = env_number("STENCIL_MAX_DX")? {
            self.max_dx = max_dx;
        }
        if let Some(max_dy) = env_number("STENCIL_MAX_DY")? {
            self.max_dy = max_dy;
        }
        Ok(())
    }

    fn validate(self) -> Result<StencilConfig> {
        let geometry = FrameGeometry::new(self.width, self.height, self.max_dx, self.max_dy)?;
        let evaluator = EvaluatorConfig::new(geometry, self.tolerances)?;
        Ok(StencilConfig {
            source: self.source,
            evaluator,
        })
    }
}

fn env_number(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a number, got '{}'", key, value)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<StencilConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg: StencilConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
