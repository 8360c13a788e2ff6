//! Native microphone capture via cpal.
//!
//! The cpal stream is not movable across threads, so each open spawns a
//! dedicated capture thread that owns the stream and parks on a command
//! channel. On finalize the thread encodes the captured samples as WAV
//! (hound), emits the bytes as ordered segments on the session's event
//! channel, posts finalize-complete and exits.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{mpsc, Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::audio::capture::{CaptureError, CaptureHandle, CapturePlatform};
use crate::audio::machine::{SessionEvent, SessionSender};

/// The container the native recorder produces.
pub const NATIVE_ENCODING: &str = "audio/wav";

/// Segment size for emitting the encoded recording.
const SEGMENT_BYTES: usize = 64 * 1024;

pub struct MicPlatform {
    sample_rate: u32,
}

impl MicPlatform {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait]
impl CapturePlatform for MicPlatform {
    fn is_supported(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    async fn open(
        &self,
        preferred_encoding: &str,
        events: SessionSender,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let encoding = negotiate_encoding(preferred_encoding);
        let sample_rate = self.sample_rate;
        let (ready_tx, ready_rx) = oneshot::channel();
        let (ctrl_tx, ctrl_rx) = mpsc::channel();

        std::thread::spawn(move || capture_thread(sample_rate, ctrl_rx, ready_tx, events));

        match ready_rx.await {
            Ok(Ok(())) => Ok(Box::new(MicCaptureHandle {
                encoding: encoding.to_string(),
                ctrl: ctrl_tx,
                active: true,
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::Device(
                "Capture thread exited before the stream opened".to_string(),
            )),
        }
    }
}

/// The native recorder only produces WAV; any other preference degrades
/// silently to it.
fn negotiate_encoding(preferred: &str) -> &'static str {
    if preferred != NATIVE_ENCODING {
        debug!("preferred encoding {preferred:?} not supported by the native recorder, using {NATIVE_ENCODING}");
    }
    NATIVE_ENCODING
}

enum DeviceCommand {
    Finalize,
    Release,
}

struct MicCaptureHandle {
    encoding: String,
    ctrl: mpsc::Sender<DeviceCommand>,
    active: bool,
}

impl CaptureHandle for MicCaptureHandle {
    fn encoding(&self) -> &str {
        &self.encoding
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn finalize(&mut self) {
        if self.active {
            self.active = false;
            let _ = self.ctrl.send(DeviceCommand::Finalize);
        }
    }

    fn release(&mut self) {
        self.active = false;
        // After finalize the capture thread has already exited and the
        // send fails silently; nothing is left to release then.
        let _ = self.ctrl.send(DeviceCommand::Release);
    }
}

impl Drop for MicCaptureHandle {
    fn drop(&mut self) {
        let _ = self.ctrl.send(DeviceCommand::Release);
    }
}

fn capture_thread(
    sample_rate: u32,
    ctrl_rx: mpsc::Receiver<DeviceCommand>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
    events: SessionSender,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err(CaptureError::NoDevice));
        return;
    };

    info!(
        "capturing from input device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
    let samples_in = samples.clone();
    let stream_events = events.clone();

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if let Ok(mut samples) = samples_in.lock() {
                samples.extend_from_slice(data);
            }
        },
        move |err| {
            error!("capture stream error: {err}");
            let _ = stream_events.send(SessionEvent::DeviceFailed(err.to_string()));
        },
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Device(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Device(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Park until told to stop; the stream records for as long as this
    // thread holds it.
    match ctrl_rx.recv() {
        Ok(DeviceCommand::Finalize) => {
            drop(stream);
            let samples = samples
                .lock()
                .map(|mut guard| std::mem::take(&mut *guard))
                .unwrap_or_default();
            debug!("capture finalized with {} samples", samples.len());

            match encode_wav(&samples, sample_rate) {
                Ok(bytes) => {
                    emit_segments(bytes, &events);
                    let _ = events.send(SessionEvent::FinalizeComplete);
                }
                Err(e) => {
                    let _ = events.send(SessionEvent::DeviceFailed(format!(
                        "Failed to encode recording: {e}"
                    )));
                }
            }
        }
        Ok(DeviceCommand::Release) | Err(_) => {
            drop(stream);
        }
    }
}

fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Emit the encoded recording in fixed-size chunks, preserving order.
fn emit_segments(bytes: Vec<u8>, events: &SessionSender) {
    for chunk in bytes.chunks(SEGMENT_BYTES) {
        let _ = events.send(SessionEvent::SegmentArrived(chunk.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn unsupported_preference_degrades_to_wav() {
        assert_eq!(negotiate_encoding("audio/webm"), NATIVE_ENCODING);
        assert_eq!(negotiate_encoding("audio/wav"), NATIVE_ENCODING);
    }

    #[test]
    fn encode_wav_produces_a_riff_container() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5], 16000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn empty_capture_still_encodes_a_header() {
        let bytes = encode_wav(&[], 16000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[test]
    fn segments_reassemble_to_the_original_bytes() {
        let original: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        let (tx, mut rx) = unbounded_channel();

        emit_segments(original.clone(), &tx);
        drop(tx);

        let mut reassembled = Vec::new();
        let mut segments = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::SegmentArrived(chunk) => {
                    assert!(chunk.len() <= SEGMENT_BYTES);
                    segments += 1;
                    reassembled.extend_from_slice(&chunk);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert!(segments > 1);
        assert_eq!(reassembled, original);
    }
}
