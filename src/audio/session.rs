//! The capture session driver.
//!
//! Owns the device handle, the segment buffer and the timer, and reacts to
//! every event the workflow produces: user actions from the control API,
//! device callbacks, and submission completions. Transitions come from the
//! pure machine in [`crate::audio::machine`]; this module performs the
//! side effects.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::assembler::{self, AssembledPayload};
use crate::audio::capture::{CaptureHandle, CapturePlatform};
use crate::audio::machine::{
    self, Effect, SessionEvent, SessionPhase, SessionReceiver, SessionSender,
};
use crate::audio::timer::RecordingTimer;
use crate::submit::SubmissionClient;
use crate::surfaces::{PageHost, SharedSurfaces};

pub const STATUS_RECORDING: &str = "Recording... Speak now";
pub const STATUS_PROCESSING: &str = "Processing your recording...";
pub const STATUS_RETRY: &str = "Error processing recording. Please try again.";
const FALLBACK_DEVICE_ERROR: &str = "Could not access microphone";

/// Encoding assumed when the handle is gone by assembly time.
const FALLBACK_ENCODING: &str = "audio/webm";

#[derive(Debug, Clone, Default)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    /// True while the session owns a device resource: an in-flight access
    /// request or an open handle. Holds exactly during the Requesting,
    /// Recording and Stopping phases.
    pub capturing: bool,
    pub capture_id: Option<Uuid>,
    pub last_error: Option<String>,
}

#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionStatus>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionStatus {
        self.inner.lock().await.clone()
    }

    async fn set(&self, status: SessionStatus) {
        *self.inner.lock().await = status;
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub preferred_encoding: String,
    /// When set, a copy of each assembled recording is kept here before
    /// submission.
    pub keep_recordings_dir: Option<PathBuf>,
}

pub struct CaptureSession {
    platform: Arc<dyn CapturePlatform>,
    submitter: Arc<SubmissionClient>,
    page_host: Arc<dyn PageHost>,
    surfaces: SharedSurfaces,
    status: SessionStatusHandle,
    events: SessionSender,
    options: SessionOptions,
    phase: SessionPhase,
    device: Option<Box<dyn CaptureHandle>>,
    opening: bool,
    segments: Vec<Vec<u8>>,
    timer: RecordingTimer,
    capture_id: Option<Uuid>,
    last_error: Option<String>,
}

impl CaptureSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Arc<dyn CapturePlatform>,
        submitter: Arc<SubmissionClient>,
        page_host: Arc<dyn PageHost>,
        surfaces: SharedSurfaces,
        status: SessionStatusHandle,
        events: SessionSender,
        options: SessionOptions,
    ) -> Self {
        Self {
            platform,
            submitter,
            page_host,
            surfaces,
            status,
            events,
            options,
            phase: SessionPhase::Idle,
            device: None,
            opening: false,
            segments: Vec::new(),
            timer: RecordingTimer::new(),
            capture_id: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Process events until the channel closes or the session reaches the
    /// terminal Done phase (the page has been replaced by the server's
    /// response; nothing further is reachable). Returns the final phase.
    pub async fn run(mut self, mut rx: SessionReceiver) -> SessionPhase {
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
            if self.phase == SessionPhase::Done {
                break;
            }
        }
        self.phase
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        // A disabled start control means the workflow entry point is shut:
        // either capture is unsupported or a session is already underway.
        if matches!(event, SessionEvent::StartRequested)
            && !self.surfaces.lock().await.start.is_enabled()
        {
            debug!("start requested while the start control is disabled, ignoring");
            return;
        }

        let name = event.name();
        let Some((next, effects)) = machine::transition(self.phase, event) else {
            debug!(
                phase = self.phase.as_str(),
                event = name,
                "event not valid in current phase, ignoring"
            );
            return;
        };

        debug!(
            from = self.phase.as_str(),
            to = next.as_str(),
            event = name,
            "session transition"
        );
        self.phase = next;

        for effect in effects {
            self.apply(effect).await;
        }

        self.publish_status().await;
    }

    async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::OpenDevice => self.open_device(),
            Effect::AdoptDevice(handle) => {
                info!(encoding = handle.encoding(), "capture device ready");
                self.opening = false;
                self.segments.clear();
                self.device = Some(handle);
            }
            Effect::EnterRecordingUi => {
                let mut ui = self.surfaces.lock().await;
                ui.recording.show();
                ui.status.set(STATUS_RECORDING);
                ui.start.disable();
                ui.stop.enable();
            }
            Effect::StartTimer => self.timer.start(self.surfaces.clone()),
            Effect::AppendSegment(data) => {
                debug!(bytes = data.len(), "segment buffered");
                self.segments.push(data);
            }
            Effect::StopTimer => self.timer.stop(),
            Effect::FinalizeDevice => {
                if let Some(device) = self.device.as_mut() {
                    if device.is_active() {
                        device.finalize();
                        device.release();
                    }
                }
            }
            Effect::EnterStoppingUi => {
                let mut ui = self.surfaces.lock().await;
                ui.recording.hide();
                ui.status.set(STATUS_PROCESSING);
                ui.start.disable();
                ui.stop.disable();
                ui.processing.show();
            }
            Effect::ReleaseDevice => {
                self.opening = false;
                if let Some(mut device) = self.device.take() {
                    device.release();
                }
            }
            Effect::AssembleAndSubmit => self.assemble_and_submit(),
            Effect::RenderDocument(document) => {
                info!(bytes = document.len(), "replacing page with server response");
                if let Err(e) = self.page_host.replace(&document) {
                    error!("failed to render server response: {e:#}");
                }
            }
            Effect::ReportCaptureError(message) => {
                self.opening = false;
                warn!("capture failed: {message}");
                let shown = if message.is_empty() {
                    FALLBACK_DEVICE_ERROR
                } else {
                    message.as_str()
                };
                let mut ui = self.surfaces.lock().await;
                ui.status.set(format!("Error: {shown}"));
                ui.recording.hide();
                ui.processing.hide();
                ui.start.enable();
                ui.stop.disable();
                drop(ui);
                self.last_error = Some(message);
            }
            Effect::ReportSubmissionError(reason) => {
                warn!("submission failed: {reason}");
                let mut ui = self.surfaces.lock().await;
                ui.status.set(STATUS_RETRY);
                ui.processing.hide();
                ui.start.enable();
                ui.stop.disable();
                drop(ui);
                self.last_error = Some(reason);
            }
        }
    }

    /// Ask the platform for microphone access. The caller is not blocked;
    /// the outcome comes back on the event channel as DeviceReady or
    /// DeviceFailed. No special UI is shown during this brief wait.
    fn open_device(&mut self) {
        let id = Uuid::new_v4();
        self.capture_id = Some(id);
        self.last_error = None;
        self.opening = true;
        info!(capture = %id, "requesting microphone access");

        let platform = Arc::clone(&self.platform);
        let preferred = self.options.preferred_encoding.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match platform.open(&preferred, events.clone()).await {
                Ok(handle) => {
                    let _ = events.send(SessionEvent::DeviceReady(handle));
                }
                Err(e) => {
                    let _ = events.send(SessionEvent::DeviceFailed(e.to_string()));
                }
            }
        });
    }

    /// Consume the segment buffer exactly once, build the payload and hand
    /// it to the submission client on a spawned task.
    fn assemble_and_submit(&mut self) {
        let encoding = match self.device.take() {
            Some(device) => device.encoding().to_string(),
            None => FALLBACK_ENCODING.to_string(),
        };
        self.opening = false;

        let segments = std::mem::take(&mut self.segments);
        let payload = assembler::assemble(segments, &encoding);
        info!(
            bytes = payload.content.len(),
            encoding = %payload.encoding,
            "recording assembled"
        );

        if let Some(dir) = &self.options.keep_recordings_dir {
            match save_recording(dir, &payload) {
                Ok(path) => debug!("kept local recording copy at {:?}", path),
                Err(e) => warn!("failed to keep local recording copy: {e:#}"),
            }
        }

        let submitter = Arc::clone(&self.submitter);
        let events = self.events.clone();
        tokio::spawn(async move {
            match submitter.submit(payload).await {
                Ok(document) => {
                    let _ = events.send(SessionEvent::SubmissionSucceeded(document));
                }
                Err(e) => {
                    let _ = events.send(SessionEvent::SubmissionFailed(e.to_string()));
                }
            }
        });
    }

    async fn publish_status(&self) {
        self.status
            .set(SessionStatus {
                phase: self.phase,
                capturing: self.opening || self.device.is_some(),
                capture_id: self.capture_id,
                last_error: self.last_error.clone(),
            })
            .await;
    }
}

fn save_recording(dir: &Path, payload: &AssembledPayload) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context("Failed to create recordings directory")?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("recording-{}.{}", timestamp, payload.extension));
    std::fs::write(&path, &payload.content).context("Failed to write recording copy")?;

    Ok(path)
}
