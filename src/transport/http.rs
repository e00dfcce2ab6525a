use super::{HttpRequest, HttpResponse, Outcome, Transport, TransportError};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::{Duration, Instant};
use tracing::debug;

/// Knobs for the reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Per-exchange timeout. Must exceed the retry chain's worst-case delay
    /// when retries are configured.
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
        }
    }
}

impl TransportSettings {
    /// Defaults overridden by `OCR_SDK_TIMEOUT_SECS`, `OCR_SDK_POOL_MAX_IDLE_PER_HOST`,
    /// `OCR_SDK_POOL_IDLE_TIMEOUT_SECS` and `OCR_SDK_PROXY_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            request_timeout: env::var("OCR_SDK_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            pool_max_idle_per_host: env::var("OCR_SDK_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout: env::var("OCR_SDK_POOL_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.pool_idle_timeout),
            proxy_url: env::var("OCR_SDK_PROXY_URL").ok(),
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(Some(settings.pool_idle_timeout));

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to create HTTP client: {}", e),
                ErrorContext::new().with_source("http_transport"),
            )
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Outcome {
        let start = Instant::now();
        let method = request.method.clone();
        let path = request.url.path().to_string();

        let mut req = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let resp = req.send().await.map_err(TransportError::from)?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(TransportError::from)?;

        debug!(
            method = %method,
            endpoint = path.as_str(),
            http_status = status,
            duration_ms = start.elapsed().as_millis() as u64,
            "ocr-cloud-sdk exchange completed"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
