//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use ocr_cloud_sdk::retry::RetryEngine;
use ocr_cloud_sdk::{AuthInfo, OcrClient, OcrClientBuilder};
use std::time::Duration;

/// base64("app:secret")
pub const BASIC_AUTH: &str = "Basic YXBwOnNlY3JldA==";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client talking to the mock server over the reqwest transport.
    pub fn client(&self, retry: RetryEngine) -> OcrClient {
        OcrClientBuilder::new()
            .auth(AuthInfo::new(&self.base_url, "app", "secret").unwrap())
            .request_timeout(Duration::from_secs(10))
            .retry_engine(retry)
            .build()
            .unwrap()
    }

    /// JSON response for a GET on `path` with `taskId=<task_id>`.
    pub async fn mock_task_get(
        &mut self,
        path: &str,
        task_id: &str,
        status: usize,
        body: &str,
    ) -> Mock {
        self.server
            .mock("GET", path)
            .match_query(Matcher::UrlEncoded("taskId".into(), task_id.into()))
            .match_header("authorization", BASIC_AUTH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// JSON response for any request with `method` on `path`.
    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, path)
            .match_query(Matcher::Any)
            .match_header("authorization", BASIC_AUTH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
