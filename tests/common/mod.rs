//! Shared fixtures: an in-memory transport that replays scripted outcomes.
#![allow(dead_code)]

use async_trait::async_trait;
use ocr_cloud_sdk::transport::{HttpRequest, HttpResponse, Outcome, Transport, TransportError};
use ocr_cloud_sdk::{AuthInfo, OcrClient, OcrClientBuilder};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded exchange.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    /// Path plus query, e.g. `/v2/getTaskStatus?taskId=T1`.
    pub target: String,
    pub authorization: Option<String>,
    pub body_len: usize,
}

/// Replays outcomes per request target.
///
/// Scripts are looked up by exact `path?query` first, then by path alone.
/// The last outcome of a script repeats forever once the others are used up.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every exchange takes `latency` of (tokio) time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(&self, target: &str, outcomes: Vec<Outcome>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(outcomes);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose path starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.target.starts_with(prefix))
            .count()
    }

    fn next(&self, path: &str, target: &str) -> Outcome {
        let mut scripts = self.scripts.lock().unwrap();
        let key = if scripts.contains_key(target) {
            target
        } else {
            path
        };
        let Some(queue) = scripts.get_mut(key) else {
            return Err(TransportError::Other(format!("no script for {}", target)));
        };
        match queue.len() {
            0 => Err(TransportError::Other(format!("script for {} is empty", target))),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap(),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Outcome {
        let path = request.url.path().to_string();
        let target = match request.url.query() {
            Some(q) => format!("{}?{}", path, q),
            None => path.clone(),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.to_string(),
            target: target.clone(),
            authorization: request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            body_len: request.body.as_ref().map(|b| b.len()).unwrap_or(0),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next(&path, &target)
    }
}

pub fn auth() -> AuthInfo {
    AuthInfo::new("http://ocr.test", "app", "secret").unwrap()
}

pub fn builder(transport: Arc<ScriptedTransport>) -> OcrClientBuilder {
    OcrClientBuilder::new()
        .auth(auth())
        .transport(transport)
        .request_timeout(Duration::from_secs(60))
}

pub fn client(transport: Arc<ScriptedTransport>) -> OcrClient {
    builder(transport).build().unwrap()
}

pub fn ok_json(body: &str) -> Outcome {
    Ok(HttpResponse::new(200, body.to_string()))
}

pub fn status(code: u16, body: &str) -> Outcome {
    Ok(HttpResponse::new(code, body.to_string()))
}

pub fn task(id: &str, status: &str) -> Outcome {
    ok_json(&format!(r#"{{"taskId":"{}","status":"{}"}}"#, id, status))
}

pub fn finished(id: &str, urls: &[&str]) -> Outcome {
    let urls: Vec<String> = urls.iter().map(|u| format!("\"{}\"", u)).collect();
    ok_json(&format!(
        r#"{{"taskId":"{}","status":"Completed","resultUrls":[{}]}}"#,
        id,
        urls.join(",")
    ))
}

pub const SUBMIT: &str = "/v2/processImage";
pub const STATUS: &str = "/v2/getTaskStatus";

pub fn status_of(id: &str) -> String {
    format!("{}?taskId={}", STATUS, id)
}
