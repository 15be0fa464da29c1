//! Terminal feedback for the replay tool.
//!
//! Pretty mode draws indicatif spinners on stderr; plain mode prints one line
//! per stage and a periodic frame count, which keeps CI logs readable.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

const PLAIN_FRAME_LOG_EVERY: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        Self::new(UiMode::parse(ui_flag), is_tty)
    }

    pub fn is_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty | UiMode::Auto => true,
                UiMode::Plain => false,
            }
    }

    fn spinner(&self, template: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner
    }

    /// Announce a named stage; completion (with elapsed time) is reported when
    /// the guard drops.
    pub fn stage(&self, name: &str) -> StageGuard {
        if self.is_pretty() {
            let spinner = self.spinner("{spinner} {msg}");
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }

    /// Counter for evaluated frames. In pretty mode the count is drawn on
    /// this stage's spinner line, so only one bar is ever live.
    pub fn frames(&self) -> FrameProgress {
        FrameProgress {
            stage: self.name.clone(),
            spinner: self.spinner.clone(),
            count: 0,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

pub struct FrameProgress {
    stage: String,
    spinner: Option<ProgressBar>,
    count: u64,
}

impl FrameProgress {
    /// Record one evaluated frame; `alert` shows in the status line.
    pub fn tick(&mut self, alert: bool) {
        self.count += 1;
        let status = if alert { "[OBSTACLE]" } else { "" };
        match &self.spinner {
            Some(spinner) => {
                spinner.set_message(format!("{}… {} frames {}", self.stage, self.count, status));
            }
            None => {
                if self.count % PLAIN_FRAME_LOG_EVERY == 0 {
                    eprintln!("    {} frames {}", self.count, status);
                }
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Plain mode prints the final count; pretty mode leaves the line to
    /// the stage guard.
    pub fn finish(self) {
        if self.spinner.is_none() && self.count % PLAIN_FRAME_LOG_EVERY != 0 {
            eprintln!("    {} frames", self.count);
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
