//! Single-line progress bar for the whole install run.
//!
//! One [`ProgressReporter`] lives for the duration of the run and owns the
//! only [`ProgressState`]. Phases borrow it mutably in turn, so the percentage
//! has exactly one writer and only ever moves forward.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;

pub const POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const FAILURE_TAIL_LINES: usize = 80;

/// A slice `[start, end]` of the overall 0..=100 range owned by one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u8,
    pub end: u8,
}

impl Window {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Percent at `fraction` (0.0..=1.0) of the way through the window.
    pub fn at(&self, fraction: f64) -> u8 {
        let span = f64::from(self.end.saturating_sub(self.start));
        let offset = (span * fraction.clamp(0.0, 1.0)).floor() as u8;
        self.start.saturating_add(offset).min(self.end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    percent: u8,
    label: String,
}

impl ProgressState {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raises the percent to `percent`; lower values are ignored.
    pub fn advance_to(&mut self, percent: u8) {
        self.percent = self.percent.max(percent.min(100));
    }

    pub fn enter(&mut self, start: u8, label: &str) {
        self.advance_to(start);
        self.label = label.to_string();
    }

    /// One polling step: +1, but never reaching `end` until [`complete`](Self::complete).
    pub fn tick(&mut self, end: u8) {
        if self.percent.saturating_add(1) < end {
            self.percent += 1;
        }
    }

    pub fn complete(&mut self, end: u8) {
        self.advance_to(end);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Success,
    Failure(String),
}

pub struct ProgressReporter {
    state: ProgressState,
    bar: ProgressBar,
    bar_mode: bool,
}

impl ProgressReporter {
    pub fn new(bar_mode: bool) -> Self {
        let bar = if bar_mode {
            let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40}] {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            state: ProgressState::default(),
            bar,
            bar_mode,
        }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn set_phase(&mut self, window: Window, label: &str) {
        self.state.enter(window.start, label);
        if !self.bar_mode {
            tracing::info!("[{:>3}%] {}", self.state.percent(), label);
        }
        self.draw();
    }

    /// Moves to `fraction` of `window`, e.g. bytes downloaded over total.
    pub fn advance_within(&mut self, window: Window, fraction: f64) {
        self.state.advance_to(window.at(fraction));
        self.draw();
    }

    pub fn complete(&mut self, window: Window) {
        self.state.complete(window.end);
        self.draw();
    }

    /// Prints a user-facing line to stdout without tearing the bar.
    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.suspend(|| println!("{}", line.as_ref()));
    }

    pub fn eprintln(&self, line: impl AsRef<str>) {
        self.bar.suspend(|| eprintln!("{}", line.as_ref()));
    }

    /// Fills the bar and ends its line. Called once, at the end of the run.
    pub fn finish(&mut self) {
        self.state.advance_to(100);
        self.draw();
        self.bar.finish();
    }

    /// Ends the bar's line where it stands, before a fatal error is printed.
    pub fn abandon(&mut self) {
        self.bar.abandon();
    }

    fn draw(&self) {
        self.bar.set_position(u64::from(self.state.percent()));
        self.bar.set_message(self.state.label().to_string());
    }

    /// Runs `command` in the background while ticking the bar through `window`.
    ///
    /// Output goes to a scratch file, never the terminal. On failure the last
    /// [`FAILURE_TAIL_LINES`] lines of it are printed and returned.
    pub async fn run_monitored(
        &mut self,
        window: Window,
        label: &str,
        mut command: Command,
    ) -> Result<MonitorOutcome> {
        let capture = NamedTempFile::new().context("Could not create capture file")?;
        let stdout = capture.as_file().try_clone()?;
        let stderr = capture.as_file().try_clone()?;

        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        self.set_phase(window, label);
        tracing::debug!("Spawning {:?}", command);

        let mut child = command
            .spawn()
            .with_context(|| format!("Could not start {}", label))?;

        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                _ = ticker.tick() => {
                    self.state.tick(window.end);
                    self.draw();
                }
            }
        };

        if status.success() {
            self.complete(window);
            tracing::info!("{} finished", label);
            return Ok(MonitorOutcome::Success);
        }

        let captured = fs::read(capture.path()).unwrap_or_default();
        let tail = tail_lines(&String::from_utf8_lossy(&captured), FAILURE_TAIL_LINES);

        self.eprintln(format!(
            "{} {} failed ({})",
            console::style("✗").red(),
            label,
            status
        ));
        self.eprintln(&tail);

        Ok(MonitorOutcome::Failure(tail))
    }
}

/// The last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
