//! stencil_replay - run a detection source through the frame evaluator.
//!
//! Reads frames from a stub scenario or a recorded JSON-lines session, emits
//! one verdict per frame as JSON lines, and prints a session summary.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use stencil_guard::overlay::Overlay;
use stencil_guard::ui::{FrameProgress, Ui};
use stencil_guard::{
    build_overlay, open_source, DetectionSource, FrameEvaluator, StencilConfig, Verdict,
    ViewTransform,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Detection source: stub://<scenario>[?frames=N] or a local .jsonl file.
    #[arg(long, env = "STENCIL_SOURCE")]
    source: Option<String>,
    /// Config file (.toml or .json). Defaults to $STENCIL_CONFIG.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write verdicts here instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Include the renderer overlay with each verdict.
    #[arg(long)]
    overlay: bool,
    /// Map overlay boxes into a view of this size (e.g. 1170x2532).
    #[arg(long, value_name = "WxH", requires = "overlay")]
    view: Option<String>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Seed for stub scenario jitter.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

#[derive(Serialize)]
struct VerdictLine<'a> {
    frame: u64,
    verdict: &'a Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay: Option<Overlay>,
}

#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    fit_frames: u64,
    alert_frames: u64,
    alert_activations: u64,
    low_light_frames: u64,
    no_vehicle_frames: u64,
}

impl Summary {
    fn record(&mut self, verdict: &Verdict, alert_was_active: bool) {
        self.frames += 1;
        if verdict.vehicle_fits {
            self.fit_frames += 1;
        }
        if verdict.obstacle_alert_active {
            self.alert_frames += 1;
            if !alert_was_active {
                self.alert_activations += 1;
            }
        }
        if verdict.low_light {
            self.low_light_frames += 1;
        }
        if verdict.vehicle.is_none() {
            self.no_vehicle_frames += 1;
        }
    }
}

fn parse_view_size(value: &str) -> Result<(f64, f64)> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("view size must look like WIDTHxHEIGHT, got '{}'", value))?;
    let w: f64 = w.trim().parse().map_err(|_| anyhow!("invalid view width '{}'", w))?;
    let h: f64 = h.trim().parse().map_err(|_| anyhow!("invalid view height '{}'", h))?;
    if w <= 0.0 || h <= 0.0 {
        return Err(anyhow!("view size must be positive, got {}x{}", w, h));
    }
    Ok((w, h))
}

struct RunOptions {
    max_frames: Option<u64>,
    overlay: bool,
    view: Option<ViewTransform>,
}

/// Evaluate frames from `source` in order, writing one verdict line each.
///
/// The frame cap is checked before pulling, so a capped run never reads past
/// the last frame it evaluates.
fn run(
    source: &mut dyn DetectionSource,
    evaluator: &mut FrameEvaluator,
    out: &mut impl Write,
    options: &RunOptions,
    progress: &mut FrameProgress,
) -> Result<Summary> {
    let geometry = *evaluator.config().geometry();
    let mut summary = Summary::default();
    let mut size_mismatch_logged = false;

    loop {
        if options.max_frames.is_some_and(|max| summary.frames >= max) {
            break;
        }
        let Some(frame) = source.next_frame()? else {
            break;
        };
        if !size_mismatch_logged
            && (frame.width as f64 != geometry.frame_width()
                || frame.height as f64 != geometry.frame_height())
        {
            log::warn!(
                "frame size {}x{} differs from configured stencil frame {}x{}",
                frame.width,
                frame.height,
                geometry.frame_width(),
                geometry.frame_height()
            );
            size_mismatch_logged = true;
        }

        let alert_was_active = evaluator.state().obstacle_present_streak()
            >= evaluator.config().tolerances().obstacle_streak_threshold;
        let verdict = evaluator.evaluate(&frame);
        summary.record(&verdict, alert_was_active);
        progress.tick(verdict.obstacle_alert_active);

        let line = VerdictLine {
            frame: evaluator.frames_evaluated(),
            verdict: &verdict,
            overlay: options.overlay.then(|| {
                let overlay = build_overlay(&verdict);
                match &options.view {
                    Some(transform) => overlay.to_view(transform),
                    None => overlay,
                }
            }),
        };
        serde_json::to_writer(&mut *out, &line)?;
        out.write_all(b"\n")?;
    }
    Ok(summary)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::from_args(Some(&args.ui), std::io::stderr().is_terminal());

    let mut cfg = {
        let _stage = ui.stage("Load config");
        match &args.config {
            Some(path) => StencilConfig::from_path(path)?,
            None => StencilConfig::load()?,
        }
    };
    if let Some(source) = args.source.clone() {
        cfg.source = source;
    }
    let geometry = *cfg.evaluator.geometry();
    log::info!(
        "stencil frame {}x{}, max offset ({}, {})",
        geometry.frame_width(),
        geometry.frame_height(),
        geometry.max_dx(),
        geometry.max_dy()
    );

    let mut source = {
        let _stage = ui.stage("Open detection source");
        let mut source = open_source(
            &cfg.source,
            geometry.frame_width() as u32,
            geometry.frame_height() as u32,
            args.seed,
        )?;
        source.connect()?;
        source
    };

    let mut out: BufWriter<Box<dyn Write>> = match &args.out {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => BufWriter::new(Box::new(std::io::stdout().lock())),
    };

    let view = match args.view.as_deref() {
        Some(value) => {
            let (w, h) = parse_view_size(value)?;
            Some(ViewTransform::fit(
                w,
                h,
                geometry.frame_width(),
                geometry.frame_height(),
            ))
        }
        None => None,
    };

    let options = RunOptions {
        max_frames: args.max_frames,
        overlay: args.overlay,
        view,
    };
    let mut evaluator = FrameEvaluator::new(cfg.evaluator.clone());
    let summary = {
        let stage = ui.stage(&format!("Evaluate frames from {}", source.name()));
        let mut progress = stage.frames();
        let summary = run(source.as_mut(), &mut evaluator, &mut out, &options, &mut progress)?;
        progress.finish();
        summary
    };
    out.flush()?;

    if summary.frames == 0 {
        return Err(anyhow!("source {} produced no frames", source.name()));
    }

    eprintln!("replay summary:");
    eprintln!("  source: {}", source.name());
    eprintln!("  frames evaluated: {}", summary.frames);
    eprintln!("  vehicle fit frames: {}", summary.fit_frames);
    eprintln!("  no-vehicle frames: {}", summary.no_vehicle_frames);
    eprintln!("  obstacle alert frames: {}", summary.alert_frames);
    eprintln!("  obstacle alert activations: {}", summary.alert_activations);
    eprintln!("  low-light frames: {}", summary.low_light_frames);
    if let Some(path) = &args.out {
        eprintln!("  verdicts: {}", path.display());
    }
    Ok(())
}
