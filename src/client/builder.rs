use crate::auth::AuthInfo;
use crate::client::core::OcrClient;
use crate::config::ClientConfig;
use crate::retry::{RetryEngine, RetryPolicy};
use crate::transport::{HttpTransport, Transport, TransportSettings};
use crate::waiter::WaitOptions;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Builder for [`OcrClient`].
///
/// Keep this surface area small and predictable: credentials, transport
/// knobs, the retry chain and wait defaults.
pub struct OcrClientBuilder {
    auth: Option<AuthInfo>,
    transport: Option<Arc<dyn Transport>>,
    settings: TransportSettings,
    retry: RetryEngine,
    retry_submissions: bool,
    wait_defaults: WaitOptions,
}

impl OcrClientBuilder {
    /// Transport defaults come from `OCR_SDK_*` environment variables.
    pub fn new() -> Self {
        Self {
            auth: None,
            transport: None,
            settings: TransportSettings::from_env(),
            retry: RetryEngine::new(),
            retry_submissions: false,
            wait_defaults: WaitOptions::default(),
        }
    }

    /// Seed every setting from a loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            auth: Some(config.auth_info()?),
            transport: None,
            settings: config.transport_settings(),
            retry: config.retry_engine()?,
            retry_submissions: config.retry_submissions,
            wait_defaults: config.wait_options(),
        })
    }

    pub fn auth(mut self, auth: AuthInfo) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replace the reqwest transport (primarily for tests and custom stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Upper bound for one logical operation, retries included.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.settings.proxy_url = Some(url.into());
        self
    }

    /// Replace the whole retry chain.
    pub fn retry_engine(mut self, engine: RetryEngine) -> Self {
        self.retry = engine;
        self
    }

    /// Append one policy to the retry chain.
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = self.retry.with_policy(policy);
        self
    }

    /// Also retry submissions. A retried submission may create a second task
    /// if the first one reached the service before failing.
    pub fn retry_submissions(mut self, enable: bool) -> Self {
        self.retry_submissions = enable;
        self
    }

    /// Default poll interval for waits that do not set their own.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.wait_defaults.poll_interval = Some(interval);
        self
    }

    /// Default wait budget for waits that do not set their own.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.wait_defaults.max_wait = Some(max_wait);
        self
    }

    pub fn build(self) -> Result<OcrClient> {
        let auth = self.auth.ok_or_else(|| {
            Error::configuration_with_context(
                "credentials are required",
                ErrorContext::new().with_source("client_builder"),
            )
        })?;

        if self.settings.request_timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "request timeout must be positive",
                ErrorContext::new().with_field_path("request_timeout"),
            ));
        }

        let worst_case = self.retry.worst_case_delay();
        if !self.retry.is_empty() && self.settings.request_timeout <= worst_case {
            warn!(
                request_timeout_ms = self.settings.request_timeout.as_millis() as u64,
                worst_case_retry_ms = worst_case.as_millis() as u64,
                policies = ?self.retry.policy_keys(),
                "request timeout does not cover the retry chain; operations may time out before retries finish"
            );
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.settings)?),
        };

        Ok(OcrClient {
            auth,
            transport,
            retry: self.retry,
            retry_submissions: self.retry_submissions,
            request_timeout: self.settings.request_timeout,
            wait_defaults: self.wait_defaults,
        })
    }
}

impl Default for OcrClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
