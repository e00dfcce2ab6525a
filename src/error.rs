use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.host", "params.region")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "task_parser", "config_loader")
    pub source: Option<String>,
    /// HTTP status of the response that produced the error, if any
    pub status_code: Option<u16>,
    /// Client-side correlation id of the request
    pub request_id: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Unified error type for the OCR client.
///
/// A task that the service reports as `Failed` is *not* an error: it comes back
/// as a regular [`crate::Task`] snapshot. Everything here is a fault of the
/// exchange itself.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity, timeout or 5xx failure; retriable per policy.
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    /// 4xx-class rejection by the service (bad parameters, unauthorized, quota).
    #[error("Service error: HTTP {status} ({class}): {message}")]
    Service {
        status: u16,
        class: String,
        message: String,
    },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Malformed or unexpected response body.
    #[error("Protocol error: {message}{}", format_context(.context))]
    Protocol {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if let Some(status) = ctx.status_code {
        parts.push(format!("status: {}", status));
    }
    if let Some(ref id) = ctx.request_id {
        parts.push(format!("request_id: {}", id));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::protocol_with_context(msg, ErrorContext::new())
    }

    pub fn protocol_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Protocol {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Whether a retry policy could reasonably retry the call that produced this error.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_retriable(),
            _ => false,
        }
    }

    /// Tag a context-carrying error with the client request id of the
    /// exchange that produced it. Other variants pass through untouched.
    pub fn with_request_id(self, id: impl Into<String>) -> Self {
        match self {
            Error::Protocol { message, context } => Error::Protocol {
                message,
                context: context.with_request_id(id),
            },
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_request_id(id),
            },
            Error::Validation { message, context } => Error::Validation {
                message,
                context: context.with_request_id(id),
            },
            other => other,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Protocol { context, .. }
            | Error::Configuration { context, .. }
            | Error::Validation { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::protocol_with_context(
            format!("Failed to parse response JSON: {}", e),
            ErrorContext::new().with_source("json_parse"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_display() {
        let err = Error::protocol_with_context(
            "missing taskId",
            ErrorContext::new()
                .with_source("task_parser")
                .with_status_code(200),
        );
        assert_eq!(
            err.to_string(),
            "Protocol error: missing taskId (source: task_parser, status: 200)"
        );
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        let err = Error::configuration("host is required");
        assert_eq!(err.to_string(), "Configuration error: host is required");
    }

    #[test]
    fn test_retriable_classification() {
        assert!(Error::Transport(TransportError::Timeout("read".into())).is_retriable());
        assert!(!Error::Transport(TransportError::Malformed("x".into())).is_retriable());
        assert!(!Error::Service {
            status: 400,
            class: "invalid_request".into(),
            message: "bad".into()
        }
        .is_retriable());
        assert!(!Error::Cancelled.is_retriable());
    }

    #[test]
    fn test_request_id_only_tags_context_errors() {
        let err = Error::protocol("bad body").with_request_id("req-1");
        assert_eq!(
            err.context().and_then(|c| c.request_id.as_deref()),
            Some("req-1")
        );
        assert!(err.to_string().ends_with("(request_id: req-1)"));

        let err = Error::Cancelled.with_request_id("req-2");
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_json_errors_become_protocol_errors() {
        let e: Error = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(e, Error::Protocol { .. }));
    }
}
