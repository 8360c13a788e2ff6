//! Capture platform boundary.
//!
//! The session never talks to audio hardware directly. It opens a
//! [`CaptureHandle`] through a [`CapturePlatform`] and receives segments,
//! the finalize notification and device errors back on its event channel.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::machine::SessionSender;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoDevice,
    #[error("{0}")]
    Device(String),
}

#[async_trait]
pub trait CapturePlatform: Send + Sync {
    /// Whether the runtime can capture audio at all. Checked once at load;
    /// when false the workflow's entry point stays disabled.
    fn is_supported(&self) -> bool;

    /// Request device access and open a capture handle negotiated for
    /// `preferred_encoding`. An unsupported preference falls back to the
    /// platform default without surfacing an error. Segments, the
    /// finalize-complete notification and runtime device errors are
    /// delivered through `events`.
    async fn open(
        &self,
        preferred_encoding: &str,
        events: SessionSender,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// An open microphone stream.
///
/// Exclusively owned by the capture session and always released via the
/// stop transition or on error.
pub trait CaptureHandle: Send + Sync {
    /// Encoding identifier negotiated at open time.
    fn encoding(&self) -> &str;

    fn is_active(&self) -> bool;

    /// Ask the device to flush any remaining segments and post
    /// finalize-complete on the event channel.
    fn finalize(&mut self);

    /// Stop the underlying hardware stream.
    fn release(&mut self);
}
