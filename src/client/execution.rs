//! Request execution: one logical operation through the retry chain, then
//! classification of whatever came back.

use crate::transport::{HttpRequest, HttpResponse, TransportError};
use crate::types::{Task, TaskList};
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::OcrClient;
use super::error_classification::{error_class_for_status, error_message_from_body};

impl OcrClient {
    /// Execute one logical operation.
    ///
    /// `retried` selects whether the retry chain applies. The whole operation,
    /// retries included, is bounded by the client's request timeout. A
    /// successful response is handed to `parse`; its errors carry the client
    /// request id.
    pub(crate) async fn execute<T>(
        &self,
        operation: &str,
        mut request: HttpRequest,
        retried: bool,
        cancel: Option<&CancellationToken>,
        parse: impl FnOnce(&HttpResponse, &str) -> Result<T>,
    ) -> Result<T> {
        let client_request_id = Uuid::new_v4().to_string();
        request
            .headers
            .insert(AUTHORIZATION, self.auth.authorization_header()?);
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(v) = HeaderValue::from_str(&client_request_id) {
            request
                .headers
                .insert(HeaderName::from_static("x-request-id"), v);
        }

        let start = Instant::now();
        let transport = &self.transport;
        let send = move || transport.send(request.clone());

        let exchange = async {
            if retried {
                self.retry.execute(operation, cancel, send).await
            } else {
                send().await.map_err(Error::Transport)
            }
        };
        let resp = match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(r) => r?,
            Err(_) => {
                info!(
                    operation,
                    request_id = client_request_id.as_str(),
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "ocr-cloud-sdk operation timed out"
                );
                return Err(Error::Transport(TransportError::Timeout(format!(
                    "{} exceeded {} ms",
                    operation,
                    self.request_timeout.as_millis()
                ))));
            }
        };

        if resp.is_success() {
            debug!(
                operation,
                http_status = resp.status,
                request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "ocr-cloud-sdk request succeeded"
            );
            return parse(&resp, operation).map_err(|e| e.with_request_id(client_request_id));
        }

        let status = resp.status;
        let class = error_class_for_status(status);
        let body = resp.text();
        let message = error_message_from_body(&body);

        info!(
            operation,
            http_status = status,
            error_class = class,
            error_message = message.as_str(),
            request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "ocr-cloud-sdk request failed"
        );

        // Server-side failures surface exactly as received.
        if (500..600).contains(&status) {
            return Err(Error::Transport(TransportError::Status { status, body }));
        }
        Err(Error::Service {
            status,
            class: class.to_string(),
            message,
        })
    }
}

pub(crate) fn parse_task(resp: &HttpResponse, operation: &str) -> Result<Task> {
    let task: Task = serde_json::from_slice(&resp.body).map_err(|e| {
        Error::protocol_with_context(
            format!("unexpected {} response: {}", operation, e),
            ErrorContext::new()
                .with_source(operation)
                .with_status_code(resp.status),
        )
    })?;
    if task.task_id.trim().is_empty() {
        return Err(Error::protocol_with_context(
            "task snapshot has an empty taskId",
            ErrorContext::new()
                .with_source(operation)
                .with_field_path("taskId"),
        ));
    }
    Ok(task)
}

pub(crate) fn parse_task_list(resp: &HttpResponse, operation: &str) -> Result<Vec<Task>> {
    if resp.body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    let list: TaskList = serde_json::from_slice(&resp.body).map_err(|e| {
        Error::protocol_with_context(
            format!("unexpected {} response: {}", operation, e),
            ErrorContext::new()
                .with_source(operation)
                .with_status_code(resp.status),
        )
    })?;
    Ok(list.tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_rejects_garbage() {
        let resp = HttpResponse::new(200, "<html>oops</html>");
        let err = parse_task(&resp, "getTaskStatus").unwrap_err();
        match err {
            Error::Protocol { context, .. } => {
                assert_eq!(context.source.as_deref(), Some("getTaskStatus"));
                assert_eq!(context.status_code, Some(200));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_task_rejects_empty_id() {
        let resp = HttpResponse::new(200, r#"{"taskId":" ","status":"Queued"}"#);
        assert!(matches!(
            parse_task(&resp, "processImage"),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_empty_list_body_is_empty_list() {
        let resp = HttpResponse::new(200, "");
        assert!(parse_task_list(&resp, "listFinishedTasks").unwrap().is_empty());
        let resp = HttpResponse::new(200, r#"{"tasks":[]}"#);
        assert!(parse_task_list(&resp, "listFinishedTasks").unwrap().is_empty());
    }
}
