use crate::auth::AuthInfo;
use crate::retry::RetryEngine;
use crate::transport::{HttpRequest, Transport};
use crate::types::{CheckmarkFieldProcessingParams, ImageProcessingParams, ProcessingParams, Task};
use crate::waiter::WaitOptions;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use url::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::error_classification::is_task_not_found;
use super::execution::{parse_task, parse_task_list};

/// Client for the recognition service.
///
/// Cheap to share behind an `Arc`: all state is read-only after
/// construction, so any number of waits may run on one client concurrently.
pub struct OcrClient {
    pub(crate) auth: AuthInfo,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) retry: RetryEngine,
    pub(crate) retry_submissions: bool,
    pub(crate) request_timeout: Duration,
    pub(crate) wait_defaults: WaitOptions,
}

impl OcrClient {
    /// Client with default transport and no retry policies.
    pub fn new(auth: AuthInfo) -> Result<Self> {
        crate::client::builder::OcrClientBuilder::new()
            .auth(auth)
            .build()
    }

    /// Client configured from `OCR_SDK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = crate::config::ClientConfig::from_env();
        crate::client::builder::OcrClientBuilder::from_config(&config)?.build()
    }

    pub fn auth(&self) -> &AuthInfo {
        &self.auth
    }

    pub fn retry_engine(&self) -> &RetryEngine {
        &self.retry
    }

    /// Submit an image for full-page recognition. Returns the freshly created task.
    pub async fn process_image(
        &self,
        params: &ImageProcessingParams,
        content: impl Into<Bytes>,
    ) -> Result<Task> {
        self.submit(params, content).await
    }

    /// Submit an image for checkmark-field recognition.
    pub async fn process_checkmark_field(
        &self,
        params: &CheckmarkFieldProcessingParams,
        content: impl Into<Bytes>,
    ) -> Result<Task> {
        self.submit(params, content).await
    }

    /// Submit `content` to the endpoint named by `params`.
    ///
    /// Exactly one task is created per successful call. Submissions only go
    /// through the retry chain when the client was built with
    /// `retry_submissions(true)`.
    pub async fn submit<P: ProcessingParams + ?Sized>(
        &self,
        params: &P,
        content: impl Into<Bytes>,
    ) -> Result<Task> {
        self.submit_with(params, content.into(), None).await
    }

    pub(crate) async fn submit_with<P: ProcessingParams + ?Sized>(
        &self,
        params: &P,
        content: Bytes,
        cancel: Option<&CancellationToken>,
    ) -> Result<Task> {
        params.validate()?;
        if content.is_empty() {
            return Err(Error::validation_with_context(
                "content is empty",
                ErrorContext::new().with_field_path("content"),
            ));
        }

        let endpoint = params.endpoint();
        let mut url = self.auth.endpoint_url(endpoint)?;
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        let request = HttpRequest::post(url, content).with_headers(headers);

        let operation = operation_name(endpoint);
        let task = self
            .execute(operation, request, self.retry_submissions, cancel, parse_task)
            .await?;
        info!(
            task_id = task.task_id.as_str(),
            status = task.status.as_str(),
            operation,
            "task submitted"
        );
        Ok(task)
    }

    /// Current snapshot of a task.
    pub async fn get_task_status(&self, task_id: &str) -> Result<Task> {
        self.get_task_status_with(task_id, None).await
    }

    pub(crate) async fn get_task_status_with(
        &self,
        task_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Task> {
        let url = self.task_url("v2/getTaskStatus", task_id)?;
        self.execute("getTaskStatus", HttpRequest::get(url), true, cancel, parse_task)
            .await
            .map_err(|e| not_found(e, task_id))
    }

    /// Every finished task known to the service for these credentials, in
    /// service order. No finished tasks is an empty list, not an error.
    pub async fn list_finished_tasks(&self) -> Result<Vec<Task>> {
        let url = self.auth.endpoint_url("v2/listFinishedTasks")?;
        self.execute(
            "listFinishedTasks",
            HttpRequest::get(url),
            true,
            None,
            parse_task_list,
        )
        .await
    }

    /// Delete a task and its results. Returns the snapshot in `Deleted` status.
    pub async fn delete_task(&self, task_id: &str) -> Result<Task> {
        let url = self.task_url("v2/deleteTask", task_id)?;
        let task = self
            .execute("deleteTask", HttpRequest::get(url), true, None, parse_task)
            .await
            .map_err(|e| not_found(e, task_id))?;
        info!(task_id = task.task_id.as_str(), "task deleted");
        Ok(task)
    }

    fn task_url(&self, endpoint: &str, task_id: &str) -> Result<Url> {
        if task_id.trim().is_empty() {
            return Err(Error::validation_with_context(
                "task id is empty",
                ErrorContext::new().with_field_path("task_id"),
            ));
        }
        let mut url = self.auth.endpoint_url(endpoint)?;
        url.query_pairs_mut().append_pair("taskId", task_id);
        Ok(url)
    }
}

fn not_found(err: Error, task_id: &str) -> Error {
    match err {
        Error::Service {
            status, ref message, ..
        } if is_task_not_found(status, message) => Error::TaskNotFound {
            task_id: task_id.to_string(),
        },
        other => other,
    }
}

/// "v2/processImage" -> "processImage"
fn operation_name(endpoint: &str) -> &str {
    endpoint.rsplit('/').next().unwrap_or(endpoint)
}
