//! Capability detection for the recording workflow.

use tracing::warn;

use crate::audio::capture::CapturePlatform;
use crate::surfaces::UiSurfaces;

pub const STATUS_UNSUPPORTED: &str = "Recording is not supported on this system";
pub const NOTICE_UNSUPPORTED: &str =
    "Audio capture is unavailable. Connect a microphone and restart the service.";

/// Check once at load whether the platform can capture audio, and gate the
/// workflow's entry point accordingly. When capture is unavailable the
/// start control is disabled and the instructional text is replaced with
/// guidance; no session transition is ever reachable after that.
pub fn detect_and_gate(platform: &dyn CapturePlatform, ui: &mut UiSurfaces) -> bool {
    let supported = platform.is_supported();

    if supported {
        ui.start.enable();
    } else {
        warn!("audio capture not supported, recording disabled");
        ui.start.disable();
        ui.stop.disable();
        ui.status.set(STATUS_UNSUPPORTED);
        ui.instructions.replace(NOTICE_UNSUPPORTED);
    }

    supported
}
