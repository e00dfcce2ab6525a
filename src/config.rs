//! Client configuration.
//!
//! Configuration can come from a YAML file, from the environment, or both
//! (environment wins):
//!
//! ```yaml
//! host: https://cloud-westus.ocrsdk.com
//! application_id: my-app
//! password: my-password
//! request_timeout_ms: 30000
//! poll_interval_ms: 2000
//! max_wait_ms: 300000
//! retry:
//!   - key: WaitAndRetryAsync_For_GatewayTimeout_504__StatusCode
//!     on_status: [504]
//!     max_retries: 3
//!     delay_ms: 3000
//! ```

use crate::auth::{AuthInfo, DEFAULT_HOST};
use crate::retry::{RetryCondition, RetryEngine, WaitAndRetry};
use crate::transport::TransportSettings;
use crate::waiter::WaitOptions;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// One declarative retry policy. Exactly one trigger must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_status: Vec<u16>,
    #[serde(default)]
    pub on_server_error: bool,
    #[serde(default)]
    pub on_transport_error: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// Upper bound on `max_retries` accepted from configuration.
pub const MAX_CONFIGURED_RETRIES: u32 = 100;

/// Upper bound on `delay_ms` accepted from configuration (one hour).
pub const MAX_CONFIGURED_DELAY_MS: u64 = 3_600_000;

fn default_max_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

impl RetryPolicyConfig {
    pub fn to_policy(&self) -> Result<WaitAndRetry> {
        let triggers = [
            !self.on_status.is_empty(),
            self.on_server_error,
            self.on_transport_error,
        ];
        if triggers.iter().filter(|t| **t).count() != 1 {
            return Err(Error::configuration_with_context(
                "a retry policy needs exactly one of on_status, on_server_error, on_transport_error",
                ErrorContext::new().with_field_path(format!("retry.{}", self.key)),
            ));
        }
        if self.max_retries > MAX_CONFIGURED_RETRIES {
            return Err(Error::configuration_with_context(
                format!("max_retries must be at most {}", MAX_CONFIGURED_RETRIES),
                ErrorContext::new()
                    .with_field_path(format!("retry.{}.max_retries", self.key))
                    .with_details(self.max_retries.to_string()),
            ));
        }
        if self.delay_ms > MAX_CONFIGURED_DELAY_MS {
            return Err(Error::configuration_with_context(
                format!("delay_ms must be at most {}", MAX_CONFIGURED_DELAY_MS),
                ErrorContext::new()
                    .with_field_path(format!("retry.{}.delay_ms", self.key))
                    .with_details(self.delay_ms.to_string()),
            ));
        }
        let condition = if !self.on_status.is_empty() {
            RetryCondition::StatusCodes(self.on_status.clone())
        } else if self.on_server_error {
            RetryCondition::ServerErrors
        } else {
            RetryCondition::TransportFailures
        };
        Ok(WaitAndRetry::new(self.key.clone(), condition)
            .with_max_retries(self.max_retries)
            .with_delay(Duration::from_millis(self.delay_ms)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: Option<String>,
    pub application_id: Option<String>,
    pub password: Option<String>,
    /// Bearer token; takes precedence over application id + password.
    pub token: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub proxy_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_wait_ms: Option<u64>,
    /// Also run submissions through the retry chain. Off by default: a
    /// retried submission can create a second task.
    pub retry_submissions: bool,
    pub retry: Vec<RetryPolicyConfig>,
}

impl ClientConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid client configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Read `OCR_SDK_*` variables; unset variables stay `None`.
    pub fn from_env() -> Self {
        let num = |name: &str| env::var(name).ok().and_then(|s| s.parse::<u64>().ok());
        Self {
            host: env::var("OCR_SDK_HOST").ok(),
            application_id: env::var("OCR_SDK_APP_ID").ok(),
            password: env::var("OCR_SDK_PASSWORD").ok(),
            token: env::var("OCR_SDK_TOKEN").ok(),
            request_timeout_ms: num("OCR_SDK_TIMEOUT_SECS").map(|s| s.saturating_mul(1000)),
            proxy_url: env::var("OCR_SDK_PROXY_URL").ok(),
            poll_interval_ms: num("OCR_SDK_POLL_INTERVAL_MS"),
            max_wait_ms: num("OCR_SDK_MAX_WAIT_MS"),
            retry_submissions: false,
            retry: Vec::new(),
        }
    }

    /// Load `path` if given, then overlay the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(base.merge(Self::from_env()))
    }

    /// Fields set in `other` override fields in `self`.
    pub fn merge(self, other: Self) -> Self {
        Self {
            host: other.host.or(self.host),
            application_id: other.application_id.or(self.application_id),
            password: other.password.or(self.password),
            token: other.token.or(self.token),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
            proxy_url: other.proxy_url.or(self.proxy_url),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            max_wait_ms: other.max_wait_ms.or(self.max_wait_ms),
            retry_submissions: other.retry_submissions || self.retry_submissions,
            retry: if other.retry.is_empty() {
                self.retry
            } else {
                other.retry
            },
        }
    }

    pub fn auth_info(&self) -> Result<AuthInfo> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        if let Some(token) = &self.token {
            return AuthInfo::with_token(host, token.clone());
        }
        match (&self.application_id, &self.password) {
            (Some(id), Some(pw)) => AuthInfo::new(host, id.clone(), pw.clone()),
            _ => Err(Error::configuration_with_context(
                "credentials required: set token, or application_id and password",
                ErrorContext::new().with_field_path("application_id"),
            )),
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        let mut settings = TransportSettings::from_env();
        if let Some(ms) = self.request_timeout_ms {
            settings.request_timeout = Duration::from_millis(ms);
        }
        if self.proxy_url.is_some() {
            settings.proxy_url = self.proxy_url.clone();
        }
        settings
    }

    pub fn retry_engine(&self) -> Result<RetryEngine> {
        self.retry
            .iter()
            .try_fold(RetryEngine::new(), |engine, p| -> Result<RetryEngine> {
                Ok(engine.with_policy(p.to_policy()?))
            })
    }

    pub fn wait_options(&self) -> WaitOptions {
        let mut options = WaitOptions::default();
        if let Some(ms) = self.poll_interval_ms {
            options = options.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = self.max_wait_ms {
            options = options.with_max_wait(Duration::from_millis(ms));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    const SAMPLE: &str = r#"
host: http://localhost:9000
application_id: app
password: pw
request_timeout_ms: 20000
poll_interval_ms: 500
retry:
  - key: gateway
    on_status: [504]
    max_retries: 3
    delay_ms: 3000
  - key: network
    on_transport_error: true
    max_retries: 2
"#;

    #[test]
    fn test_parse_yaml() {
        let cfg = ClientConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.host.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cfg.retry.len(), 2);
        assert_eq!(cfg.retry[1].delay_ms, 1000);
        assert!(!cfg.retry_submissions);

        let engine = cfg.retry_engine().unwrap();
        assert_eq!(engine.policy_keys(), vec!["gateway", "network"]);
        assert_eq!(engine.worst_case_delay(), Duration::from_millis(11_000));
        assert_eq!(
            cfg.transport_settings().request_timeout,
            Duration::from_secs(20)
        );
        assert_eq!(cfg.wait_options().poll_interval, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_policy_needs_exactly_one_trigger() {
        let none = RetryPolicyConfig {
            key: "k".into(),
            on_status: vec![],
            on_server_error: false,
            on_transport_error: false,
            max_retries: 1,
            delay_ms: 1,
        };
        assert!(none.to_policy().is_err());
        let two = RetryPolicyConfig {
            on_status: vec![504],
            on_server_error: true,
            ..none.clone()
        };
        assert!(two.to_policy().is_err());
    }

    #[test]
    fn test_out_of_range_policy_is_rejected() {
        let cfg = ClientConfig::from_yaml_str(
            r#"
retry:
  - key: gateway
    on_status: [504]
    max_retries: 2000
    delay_ms: 18446744073709551615
"#,
        )
        .unwrap();
        match cfg.retry_engine() {
            Err(Error::Configuration { context, .. }) => {
                assert_eq!(context.field_path.as_deref(), Some("retry.gateway.max_retries"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }

        let slow = RetryPolicyConfig {
            key: "slow".into(),
            on_status: vec![504],
            on_server_error: false,
            on_transport_error: false,
            max_retries: 1,
            delay_ms: MAX_CONFIGURED_DELAY_MS + 1,
        };
        assert!(matches!(slow.to_policy(), Err(Error::Configuration { .. })));

        let edge = RetryPolicyConfig {
            max_retries: MAX_CONFIGURED_RETRIES,
            delay_ms: MAX_CONFIGURED_DELAY_MS,
            ..slow
        };
        let policy = edge.to_policy().unwrap();
        assert_eq!(
            RetryEngine::new().with_policy(policy).worst_case_delay(),
            Duration::from_millis(MAX_CONFIGURED_DELAY_MS * MAX_CONFIGURED_RETRIES as u64)
        );
    }

    #[test]
    fn test_token_wins_over_application_credentials() {
        let cfg = ClientConfig {
            application_id: Some("a".into()),
            password: Some("b".into()),
            token: Some("t".into()),
            ..Default::default()
        };
        let auth = cfg.auth_info().unwrap();
        assert_eq!(auth.credentials, Credentials::Token("t".into()));
        assert_eq!(auth.host.as_str(), "https://cloud-westus.ocrsdk.com/");
    }

    #[test]
    fn test_missing_credentials() {
        let cfg = ClientConfig {
            application_id: Some("a".into()),
            ..Default::default()
        };
        assert!(matches!(cfg.auth_info(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = ClientConfig::from_yaml_str(SAMPLE).unwrap();
        let overlay = ClientConfig {
            host: Some("https://other".into()),
            ..Default::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.host.as_deref(), Some("https://other"));
        assert_eq!(merged.application_id.as_deref(), Some("app"));
        assert_eq!(merged.retry.len(), 2);
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        let err = ClientConfig::from_yaml_str("retry: [oops").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
