//! Service credentials.

use crate::{Error, ErrorContext, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::HeaderValue;
use url::Url;
use std::fmt;

/// Default service location.
pub const DEFAULT_HOST: &str = "https://cloud-westus.ocrsdk.com";

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Application id + application password, sent as HTTP basic auth.
    Application {
        application_id: String,
        password: String,
    },
    /// Pre-issued bearer token.
    Token(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Application { application_id, .. } => f
                .debug_struct("Application")
                .field("application_id", application_id)
                .field("password", &"***")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
        }
    }
}

/// Host plus credentials; shared read-only by every call of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub host: Url,
    pub credentials: Credentials,
}

impl AuthInfo {
    pub fn new(
        host: &str,
        application_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            host: parse_host(host)?,
            credentials: Credentials::Application {
                application_id: application_id.into(),
                password: password.into(),
            },
        })
    }

    pub fn with_token(host: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            host: parse_host(host)?,
            credentials: Credentials::Token(token.into()),
        })
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> Result<HeaderValue> {
        let raw = match &self.credentials {
            Credentials::Application {
                application_id,
                password,
            } => {
                let encoded = STANDARD.encode(format!("{}:{}", application_id, password));
                format!("Basic {}", encoded)
            }
            Credentials::Token(token) => format!("Bearer {}", token),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            Error::configuration_with_context(
                "credentials contain characters not allowed in an HTTP header",
                ErrorContext::new().with_source("auth"),
            )
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Resolve an endpoint path (e.g. `v2/getTaskStatus`) against the host.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.host.join(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot build endpoint URL: {}", e),
                ErrorContext::new().with_field_path("host"),
            )
        })
    }
}

fn parse_host(host: &str) -> Result<Url> {
    // A trailing slash makes `Url::join` append instead of replacing the last segment.
    let normalized = if host.ends_with('/') {
        host.to_string()
    } else {
        format!("{}/", host)
    };
    let url = Url::parse(&normalized).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid host URL {:?}: {}", host, e),
            ErrorContext::new().with_field_path("host"),
        )
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::configuration_with_context(
            format!("unsupported scheme {:?}", url.scheme()),
            ErrorContext::new().with_field_path("host"),
        ));
    }
    Ok(url)
}
