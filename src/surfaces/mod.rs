//! UI surface context for the recording workflow.
//!
//! Every control and display element the session touches lives in one
//! [`UiSurfaces`] value handed to components at construction. The control
//! API reads from it, the session driver writes to it. No ambient globals.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A user-facing control that can be enabled or disabled.
#[derive(Debug, Clone)]
pub struct Control {
    label: &'static str,
    enabled: bool,
}

impl Control {
    fn new(label: &'static str, enabled: bool) -> Self {
        Self { label, enabled }
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            debug!("{} control enabled", self.label);
        }
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        if self.enabled {
            debug!("{} control disabled", self.label);
        }
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// A binary indicator lamp (recording dot, processing spinner).
#[derive(Debug, Clone)]
pub struct Indicator {
    label: &'static str,
    visible: bool,
}

impl Indicator {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            visible: false,
        }
    }

    pub fn show(&mut self) {
        if !self.visible {
            debug!("{} indicator shown", self.label);
        }
        self.visible = true;
    }

    pub fn hide(&mut self) {
        if self.visible {
            debug!("{} indicator hidden", self.label);
        }
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Single-line status text shown to the operator.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    text: String,
}

impl StatusLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        debug!("status: {}", self.text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The `MM:SS` elapsed-time readout.
#[derive(Debug, Clone)]
pub struct TimerDisplay {
    text: String,
}

impl TimerDisplay {
    pub fn set(&mut self, text: String) {
        self.text = text;
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Instructional panel; replaced with guidance when capture is unavailable.
#[derive(Debug, Clone)]
pub struct Notice {
    text: String,
}

impl Notice {
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        debug!("instructions: {}", self.text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The complete set of controls and display surfaces owned by the workflow.
#[derive(Debug, Clone)]
pub struct UiSurfaces {
    pub start: Control,
    pub stop: Control,
    pub status: StatusLine,
    pub timer: TimerDisplay,
    pub recording: Indicator,
    pub processing: Indicator,
    pub instructions: Notice,
}

impl UiSurfaces {
    pub fn new() -> Self {
        Self {
            start: Control::new("start", true),
            stop: Control::new("stop", false),
            status: StatusLine {
                text: "Press record to start".to_string(),
            },
            timer: TimerDisplay {
                text: "00:00".to_string(),
            },
            recording: Indicator::new("recording"),
            processing: Indicator::new("processing"),
            instructions: Notice {
                text: "Record a voice note and it will be processed automatically.".to_string(),
            },
        }
    }
}

impl Default for UiSurfaces {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSurfaces = Arc<Mutex<UiSurfaces>>;

pub fn shared() -> SharedSurfaces {
    Arc::new(Mutex::new(UiSurfaces::new()))
}

/// Receives the server's rendered document once submission succeeds.
///
/// Rendering is a terminal effect: the session never transitions again
/// after handing the document over.
pub trait PageHost: Send + Sync {
    fn replace(&self, document: &str) -> Result<()>;
}

/// Writes the rendered document to stdout.
pub struct StdoutPageHost;

impl PageHost for StdoutPageHost {
    fn replace(&self, document: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(document.as_bytes())
            .context("Failed to write rendered document")?;
        if !document.ends_with('\n') {
            writeln!(stdout).context("Failed to write rendered document")?;
        }
        stdout.flush().context("Failed to flush rendered document")?;
        Ok(())
    }
}
