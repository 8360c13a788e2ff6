//! Submission client tests against a stub processing server.

mod common;

use axum::http::StatusCode;
use voxpost::audio::assembler::assemble;
use voxpost::submit::{SubmissionClient, SubmitError};

#[tokio::test]
async fn success_returns_the_rendered_document() {
    let (endpoint, requests) = common::spawn_stub(StatusCode::OK, "<html>Result</html>").await;
    let client = SubmissionClient::new(endpoint);

    let payload = assemble(
        vec![b"seg1".to_vec(), b"seg2".to_vec()],
        "audio/ogg; codecs=opus",
    );
    let document = client.submit(payload).await.unwrap();
    assert_eq!(document, "<html>Result</html>");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert!(common::body_contains(
        body,
        b"name=\"audio\"; filename=\"recording.ogg\""
    ));
    assert!(common::body_contains(body, b"name=\"mime_type\""));
    assert!(common::body_contains(body, b"audio/ogg; codecs=opus"));
    assert!(common::body_contains(body, b"seg1seg2"));
}

#[tokio::test]
async fn created_status_also_counts_as_success() {
    let (endpoint, _requests) = common::spawn_stub(StatusCode::CREATED, "<html>ok</html>").await;
    let client = SubmissionClient::new(endpoint);

    let document = client
        .submit(assemble(vec![b"x".to_vec()], "audio/webm"))
        .await
        .unwrap();
    assert_eq!(document, "<html>ok</html>");
}

#[tokio::test]
async fn non_success_status_is_an_error_carrying_the_code() {
    let (endpoint, _requests) = common::spawn_stub(StatusCode::BAD_GATEWAY, "bad").await;
    let client = SubmissionClient::new(endpoint);

    let err = client
        .submit(assemble(vec![], "audio/webm"))
        .await
        .unwrap_err();
    match err {
        SubmitError::Status { status } => assert_eq!(status.as_u16(), 502),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = SubmissionClient::new("http://127.0.0.1:1/process_voice".to_string());

    let err = client
        .submit(assemble(vec![b"x".to_vec()], "audio/webm"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Network(_)));
}

#[tokio::test]
async fn empty_payload_is_submitted_not_rejected() {
    let (endpoint, requests) = common::spawn_stub(StatusCode::OK, "<html>empty</html>").await;
    let client = SubmissionClient::new(endpoint);

    let document = client
        .submit(assemble(vec![], "audio/webm"))
        .await
        .unwrap();
    assert_eq!(document, "<html>empty</html>");
    assert_eq!(requests.lock().unwrap().len(), 1);
}
