//! The recording session state machine.
//!
//! Transitions are modelled as a pure function from the current phase and
//! an incoming event to the next phase plus a list of side effects for the
//! driver to perform. Events that are not valid in the current phase
//! produce `None` and are dropped by the caller, which is what guards the
//! workflow against stray clicks arriving during suspension points.

use std::fmt;

use tokio::sync::mpsc;

use crate::audio::capture::CaptureHandle;

/// Channel on which everything the session reacts to arrives: user
/// actions, device callbacks and network completions.
pub type SessionSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionReceiver = mpsc::UnboundedReceiver<SessionEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Requesting,
    Recording,
    Stopping,
    Processing,
    Done,
    Errored,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Requesting => "requesting",
            SessionPhase::Recording => "recording",
            SessionPhase::Stopping => "stopping",
            SessionPhase::Processing => "processing",
            SessionPhase::Done => "done",
            SessionPhase::Errored => "errored",
        }
    }
}

pub enum SessionEvent {
    /// Start control activated.
    StartRequested,
    /// Stop control activated.
    StopRequested,
    /// Device access granted and the capture handle is open.
    DeviceReady(Box<dyn CaptureHandle>),
    /// Device access denied, or the device failed while open.
    DeviceFailed(String),
    /// One chunk of captured audio arrived.
    SegmentArrived(Vec<u8>),
    /// The device flushed its last segment and shut down.
    FinalizeComplete,
    /// The server accepted the recording and returned a rendered document.
    SubmissionSucceeded(String),
    /// Submission failed (network error, non-2xx status, unreadable body).
    SubmissionFailed(String),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartRequested => "start_requested",
            SessionEvent::StopRequested => "stop_requested",
            SessionEvent::DeviceReady(_) => "device_ready",
            SessionEvent::DeviceFailed(_) => "device_failed",
            SessionEvent::SegmentArrived(_) => "segment_arrived",
            SessionEvent::FinalizeComplete => "finalize_complete",
            SessionEvent::SubmissionSucceeded(_) => "submission_succeeded",
            SessionEvent::SubmissionFailed(_) => "submission_failed",
        }
    }
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::SegmentArrived(data) => {
                write!(f, "SegmentArrived({} bytes)", data.len())
            }
            SessionEvent::DeviceFailed(message) => write!(f, "DeviceFailed({message:?})"),
            SessionEvent::SubmissionFailed(reason) => write!(f, "SubmissionFailed({reason:?})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Side effects the driver performs after a transition is accepted.
pub enum Effect {
    /// Ask the platform for microphone access (spawned, completion comes
    /// back as `DeviceReady` or `DeviceFailed`).
    OpenDevice,
    /// Store the open handle and clear the segment buffer.
    AdoptDevice(Box<dyn CaptureHandle>),
    /// Recording indicator on, status text, start disabled, stop enabled.
    EnterRecordingUi,
    StartTimer,
    AppendSegment(Vec<u8>),
    StopTimer,
    /// Signal the handle to finalize and stop the hardware tracks.
    FinalizeDevice,
    /// Indicator off, processing message and indicator, both controls off.
    EnterStoppingUi,
    /// Drop the handle without finalizing (error paths).
    ReleaseDevice,
    /// Consume the segment buffer, build the payload and submit it.
    AssembleAndSubmit,
    /// Hand the rendered document to the page host (terminal effect).
    RenderDocument(String),
    /// Errored-state UI for a device failure, surfacing the message.
    ReportCaptureError(String),
    /// Errored-state UI for a failed submission (generic retry prompt).
    ReportSubmissionError(String),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Effect::OpenDevice => "OpenDevice",
            Effect::AdoptDevice(_) => "AdoptDevice",
            Effect::EnterRecordingUi => "EnterRecordingUi",
            Effect::StartTimer => "StartTimer",
            Effect::AppendSegment(_) => "AppendSegment",
            Effect::StopTimer => "StopTimer",
            Effect::FinalizeDevice => "FinalizeDevice",
            Effect::EnterStoppingUi => "EnterStoppingUi",
            Effect::ReleaseDevice => "ReleaseDevice",
            Effect::AssembleAndSubmit => "AssembleAndSubmit",
            Effect::RenderDocument(_) => "RenderDocument",
            Effect::ReportCaptureError(_) => "ReportCaptureError",
            Effect::ReportSubmissionError(_) => "ReportSubmissionError",
        };
        f.write_str(name)
    }
}

/// Apply `event` to `phase`. Returns the next phase and the effects to
/// perform, or `None` when the event is not valid in this phase.
pub fn transition(
    phase: SessionPhase,
    event: SessionEvent,
) -> Option<(SessionPhase, Vec<Effect>)> {
    use SessionEvent as E;
    use SessionPhase as P;

    match (phase, event) {
        (P::Idle | P::Errored, E::StartRequested) => {
            Some((P::Requesting, vec![Effect::OpenDevice]))
        }
        (P::Requesting, E::DeviceReady(handle)) => Some((
            P::Recording,
            vec![
                Effect::AdoptDevice(handle),
                Effect::EnterRecordingUi,
                Effect::StartTimer,
            ],
        )),
        (P::Requesting, E::DeviceFailed(message)) => {
            Some((P::Errored, vec![Effect::ReportCaptureError(message)]))
        }
        // Segments keep arriving while the device finalizes; arrival order
        // is preserved through to reassembly.
        (P::Recording | P::Stopping, E::SegmentArrived(data)) => {
            Some((phase, vec![Effect::AppendSegment(data)]))
        }
        (P::Recording, E::StopRequested) => Some((
            P::Stopping,
            vec![
                Effect::StopTimer,
                Effect::FinalizeDevice,
                Effect::EnterStoppingUi,
            ],
        )),
        (P::Recording, E::DeviceFailed(message)) => Some((
            P::Errored,
            vec![
                Effect::StopTimer,
                Effect::ReleaseDevice,
                Effect::ReportCaptureError(message),
            ],
        )),
        (P::Stopping, E::DeviceFailed(message)) => Some((
            P::Errored,
            vec![
                Effect::ReleaseDevice,
                Effect::ReportCaptureError(message),
            ],
        )),
        (P::Stopping, E::FinalizeComplete) => {
            Some((P::Processing, vec![Effect::AssembleAndSubmit]))
        }
        (P::Processing, E::SubmissionSucceeded(document)) => {
            Some((P::Done, vec![Effect::RenderDocument(document)]))
        }
        (P::Processing, E::SubmissionFailed(reason)) => {
            Some((P::Errored, vec![Effect::ReportSubmissionError(reason)]))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHandle;

    impl CaptureHandle for NullHandle {
        fn encoding(&self) -> &str {
            "audio/webm"
        }
        fn is_active(&self) -> bool {
            false
        }
        fn finalize(&mut self) {}
        fn release(&mut self) {}
    }

    fn ready() -> SessionEvent {
        SessionEvent::DeviceReady(Box::new(NullHandle))
    }

    #[test]
    fn start_from_idle_requests_the_device() {
        let (next, effects) = transition(SessionPhase::Idle, SessionEvent::StartRequested)
            .expect("start is valid from idle");
        assert_eq!(next, SessionPhase::Requesting);
        assert!(matches!(effects.as_slice(), [Effect::OpenDevice]));
    }

    #[test]
    fn start_from_errored_is_a_retry() {
        let (next, _) = transition(SessionPhase::Errored, SessionEvent::StartRequested).unwrap();
        assert_eq!(next, SessionPhase::Requesting);
    }

    #[test]
    fn start_is_rejected_while_busy() {
        for phase in [
            SessionPhase::Requesting,
            SessionPhase::Recording,
            SessionPhase::Stopping,
            SessionPhase::Processing,
            SessionPhase::Done,
        ] {
            assert!(transition(phase, SessionEvent::StartRequested).is_none());
        }
    }

    #[test]
    fn stop_without_an_open_device_is_a_noop() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Requesting,
            SessionPhase::Stopping,
            SessionPhase::Processing,
            SessionPhase::Done,
            SessionPhase::Errored,
        ] {
            assert!(transition(phase, SessionEvent::StopRequested).is_none());
        }
    }

    #[test]
    fn grant_enters_recording_with_timer_and_ui() {
        let (next, effects) = transition(SessionPhase::Requesting, ready()).unwrap();
        assert_eq!(next, SessionPhase::Recording);
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::AdoptDevice(_),
                Effect::EnterRecordingUi,
                Effect::StartTimer
            ]
        ));
    }

    #[test]
    fn denial_surfaces_the_message() {
        let (next, effects) = transition(
            SessionPhase::Requesting,
            SessionEvent::DeviceFailed("Permission denied".into()),
        )
        .unwrap();
        assert_eq!(next, SessionPhase::Errored);
        match effects.as_slice() {
            [Effect::ReportCaptureError(message)] => {
                assert_eq!(message.as_str(), "Permission denied")
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn segments_are_buffered_while_recording_and_stopping() {
        for phase in [SessionPhase::Recording, SessionPhase::Stopping] {
            let (next, effects) =
                transition(phase, SessionEvent::SegmentArrived(b"chunk".to_vec())).unwrap();
            assert_eq!(next, phase);
            assert!(matches!(effects.as_slice(), [Effect::AppendSegment(_)]));
        }
    }

    #[test]
    fn segments_are_dropped_in_other_phases() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Processing,
            SessionPhase::Done,
            SessionPhase::Errored,
        ] {
            assert!(transition(phase, SessionEvent::SegmentArrived(vec![1])).is_none());
        }
    }

    #[test]
    fn stop_finalizes_and_shows_processing() {
        let (next, effects) =
            transition(SessionPhase::Recording, SessionEvent::StopRequested).unwrap();
        assert_eq!(next, SessionPhase::Stopping);
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::StopTimer,
                Effect::FinalizeDevice,
                Effect::EnterStoppingUi
            ]
        ));
    }

    #[test]
    fn finalize_complete_hands_off_to_submission() {
        let (next, effects) =
            transition(SessionPhase::Stopping, SessionEvent::FinalizeComplete).unwrap();
        assert_eq!(next, SessionPhase::Processing);
        assert!(matches!(effects.as_slice(), [Effect::AssembleAndSubmit]));
    }

    #[test]
    fn submission_outcome_is_terminal_or_recoverable() {
        let (next, effects) = transition(
            SessionPhase::Processing,
            SessionEvent::SubmissionSucceeded("<html>OK</html>".into()),
        )
        .unwrap();
        assert_eq!(next, SessionPhase::Done);
        assert!(matches!(effects.as_slice(), [Effect::RenderDocument(_)]));

        let (next, effects) = transition(
            SessionPhase::Processing,
            SessionEvent::SubmissionFailed("server returned status 500".into()),
        )
        .unwrap();
        assert_eq!(next, SessionPhase::Errored);
        assert!(matches!(
            effects.as_slice(),
            [Effect::ReportSubmissionError(_)]
        ));
    }

    #[test]
    fn done_is_terminal() {
        assert!(transition(SessionPhase::Done, SessionEvent::StartRequested).is_none());
        assert!(transition(SessionPhase::Done, SessionEvent::FinalizeComplete).is_none());
        assert!(transition(SessionPhase::Done, ready()).is_none());
    }

    #[test]
    fn late_device_errors_after_processing_are_ignored() {
        for phase in [
            SessionPhase::Processing,
            SessionPhase::Done,
            SessionPhase::Errored,
        ] {
            assert!(transition(phase, SessionEvent::DeviceFailed("late".into())).is_none());
        }
    }
}
