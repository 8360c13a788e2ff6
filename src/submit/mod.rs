//! Submission of assembled recordings to the processing server.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::assembler::AssembledPayload;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Server error: {status}")]
    Status { status: StatusCode },
    #[error("Failed to reach processing server: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to build submission request: {0}")]
    Request(String),
}

/// Posts recordings to the processing server as multipart form data and
/// returns the rendered response document.
pub struct SubmissionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SubmissionClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit the payload. Field `audio` carries the binary recording
    /// under `recording.<extension>`, field `mime_type` the negotiated
    /// encoding identifier. Any 2xx status yields the full response body;
    /// everything else is a failure. No retries.
    pub async fn submit(&self, payload: AssembledPayload) -> Result<String, SubmitError> {
        let file_name = payload.file_name();
        debug!(
            bytes = payload.content.len(),
            encoding = %payload.encoding,
            %file_name,
            "submitting recording to {}",
            self.endpoint
        );

        let part = Part::bytes(payload.content)
            .file_name(file_name)
            .mime_str(&payload.encoding)
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        let form = Form::new()
            .part("audio", part)
            .text("mime_type", payload.encoding);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status { status });
        }

        let document = response.text().await?;
        info!(bytes = document.len(), "processing server accepted the recording");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_the_code() {
        let err = SubmitError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert!(err.to_string().contains("500"));
    }
}
