//! End-to-end calls through the reqwest transport.

use super::mock_server::{MockServerFixture, BASIC_AUTH};
use mockito::Matcher;
use ocr_cloud_sdk::retry::{RetryEngine, WaitAndRetry};
use ocr_cloud_sdk::transport::TransportError;
use ocr_cloud_sdk::{Error, ExportFormat, ImageProcessingParams, TaskStatus, WaitOptions};
use std::time::Duration;

#[tokio::test]
async fn test_process_and_wait_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let submit = fixture
        .server
        .mock("POST", "/v2/processImage")
        .match_query(Matcher::UrlEncoded("exportFormat".into(), "txt".into()))
        .match_header("authorization", BASIC_AUTH)
        .match_header("content-type", "application/octet-stream")
        .match_body("fake image bytes")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"taskId":"T1","status":"Queued","requestStatusCheckTimeout":10}"#)
        .expect(1)
        .create_async()
        .await;
    let status = fixture
        .mock_task_get(
            "/v2/getTaskStatus",
            "T1",
            200,
            r#"{"taskId":"T1","status":"Completed","resultUrls":["https://x/r1"]}"#,
        )
        .await;

    let client = fixture.client(RetryEngine::new());
    let params = ImageProcessingParams::default().export_formats([ExportFormat::Txt]);
    let outcome = client
        .process_and_wait(&params, "fake image bytes", WaitOptions::default())
        .await
        .unwrap();

    let task = outcome.into_task().unwrap();
    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(task.result_urls, vec!["https://x/r1".to_string()]);
    submit.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn test_gateway_timeout_over_http_is_retried_to_cap() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/v2/getTaskStatus")
        .match_query(Matcher::Any)
        .with_status(504)
        .with_body("Gateway Timeout")
        .expect(3)
        .create_async()
        .await;

    let client = fixture.client(
        RetryEngine::new().with_policy(WaitAndRetry::gateway_timeout(2, Duration::from_millis(20))),
    );
    let err = client.get_task_status("T1").await.unwrap_err();

    match err {
        Error::Transport(TransportError::Status { status, body }) => {
            assert_eq!(status, 504);
            assert_eq!(body, "Gateway Timeout");
        }
        other => panic!("expected 504, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_service_error() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json(
            "GET",
            "/v2/listFinishedTasks",
            401,
            r#"{"error":{"message":"Invalid application credentials"}}"#,
        )
        .await;

    let err = fixture
        .client(RetryEngine::new())
        .list_finished_tasks()
        .await
        .unwrap_err();
    match err {
        Error::Service {
            status,
            class,
            message,
        } => {
            assert_eq!(status, 401);
            assert_eq!(class, "authentication");
            assert_eq!(message, "Invalid application credentials");
        }
        other => panic!("expected service error, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_and_delete_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let list = fixture
        .mock_json("GET", "/v2/listFinishedTasks", 200, r#"{"tasks":[]}"#)
        .await;
    let delete = fixture
        .mock_task_get(
            "/v2/deleteTask",
            "T9",
            200,
            r#"{"taskId":"T9","status":"Deleted"}"#,
        )
        .await;
    let missing = fixture
        .mock_task_get("/v2/getTaskStatus", "missing", 404, "")
        .await;

    let client = fixture.client(RetryEngine::new());
    assert!(client.list_finished_tasks().await.unwrap().is_empty());
    assert_eq!(
        client.delete_task("T9").await.unwrap().status,
        TaskStatus::Deleted
    );
    assert!(matches!(
        client.get_task_status("missing").await,
        Err(Error::TaskNotFound { .. })
    ));

    list.assert_async().await;
    delete.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let client = ocr_cloud_sdk::OcrClientBuilder::new()
        .auth(ocr_cloud_sdk::AuthInfo::new("http://127.0.0.1:1", "app", "secret").unwrap())
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let err = client.get_task_status("T1").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {:?}", err);
}
