use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::{ApiServer, ControlState};
use crate::audio::{
    capability, CaptureSession, MicPlatform, SessionOptions, SessionPhase, SessionStatusHandle,
};
use crate::config::Config;
use crate::global;
use crate::submit::SubmissionClient;
use crate::surfaces::{self, StdoutPageHost};

pub async fn run_service() -> Result<()> {
    info!("Starting voxpost service");

    let config = Config::load()?;

    let platform = Arc::new(MicPlatform::new(config.capture.sample_rate));
    let surfaces = surfaces::shared();

    let supported = capability::detect_and_gate(platform.as_ref(), &mut *surfaces.lock().await);

    let keep_recordings_dir = if config.behavior.keep_recordings {
        Some(global::recordings_dir()?)
    } else {
        None
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let status = SessionStatusHandle::default();
    let submitter = Arc::new(SubmissionClient::new(config.server.endpoint.clone()));

    let session = CaptureSession::new(
        platform,
        submitter,
        Arc::new(StdoutPageHost),
        surfaces.clone(),
        status.clone(),
        tx.clone(),
        SessionOptions {
            preferred_encoding: config.capture.preferred_encoding.clone(),
            keep_recordings_dir,
        },
    );

    let api_server = ApiServer::new(
        ControlState {
            events: tx,
            status,
            surfaces,
        },
        config.control.port,
    );
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("control API failed: {e:#}");
        }
    });

    if supported {
        info!("voxpost is ready!");
        info!(
            "Start recording:  curl -X POST http://127.0.0.1:{}/record/start",
            config.control.port
        );
        info!(
            "Stop and submit:  curl -X POST http://127.0.0.1:{}/record/stop",
            config.control.port
        );
        info!("Recordings are submitted to {}", config.server.endpoint);
    } else {
        info!("voxpost is running, but recording is unavailable on this system");
    }

    // The run loop ends once the server's response document has replaced
    // the page; everything after that belongs to the rendered document.
    let final_phase = session.run(rx).await;
    if final_phase == SessionPhase::Done {
        info!("session complete, document rendered");
    }

    Ok(())
}
