//! Detection input.
//!
//! The object detector is an external collaborator. This module defines the
//! per-frame contract it delivers (`FrameDetections`) and the sources that
//! stand in for it:
//! - `stub://<scenario>[?frames=N]` synthetic scenes (testing, demos)
//! - local JSON-lines files recorded from a capture session
//!
//! Sources MUST NOT reach the network; any URL scheme other than `stub://` is
//! rejected.

mod result;
mod source;
pub mod sources;

use anyhow::{anyhow, Result};

pub use result::{is_vehicle_label, DetectedObject, FrameDetections, VEHICLE_LABELS};
pub use source::DetectionSource;
pub use sources::{ReplaySource, Scenario, StubConfig, StubSource};

const STUB_SCHEME: &str = "stub://";

/// Open a detection source by URI.
///
/// `width`/`height` size synthetic frames; `seed` drives stub jitter.
pub fn open_source(
    uri: &str,
    width: u32,
    height: u32,
    seed: u64,
) -> Result<Box<dyn DetectionSource>> {
    if let Some(rest) = uri.strip_prefix(STUB_SCHEME) {
        let (scenario, query) = match rest.split_once('?') {
            Some((scenario, query)) => (scenario, Some(query)),
            None => (rest, None),
        };
        let mut config = StubConfig::new(Scenario::parse(scenario)?, width, height);
        config.seed = seed;
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some(("frames", value)) => {
                        config.frames = value
                            .parse()
                            .map_err(|_| anyhow!("stub frames must be an integer: {}", value))?;
                    }
                    Some(("jitter", value)) => {
                        config.jitter_px = value
                            .parse()
                            .map_err(|_| anyhow!("stub jitter must be a number: {}", value))?;
                    }
                    _ => return Err(anyhow!("unsupported stub option '{}'", pair)),
                }
            }
        }
        return Ok(Box::new(StubSource::new(config)?));
    }
    Ok(Box::new(ReplaySource::new(uri)?))
}
