//! voxpost: record a voice note from the microphone and post it to a
//! processing server, replacing the page with the server's rendered
//! response.
//!
//! The core is the capture session state machine in [`audio::machine`]
//! and its driver in [`audio::session`]; everything else is the platform
//! boundary (cpal microphone capture), the submission client, the UI
//! surface context and the local control API.

pub mod api;
pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod global;
pub mod submit;
pub mod surfaces;
