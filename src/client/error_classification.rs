//! Error classification logic

/// Map a non-success HTTP status to a coarse error class used in logs and
/// [`crate::Error::Service`].
pub(crate) fn error_class_for_status(status: u16) -> &'static str {
    match status {
        400 => "invalid_request",
        401 => "authentication",
        402 => "quota_exhausted",
        403 => "permission_denied",
        404 => "not_found",
        408 => "timeout",
        409 => "conflict",
        413 => "request_too_large",
        429 => "rate_limited",
        504 => "gateway_timeout",
        500..=599 => "server_error",
        _ => "http_error",
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error":{"message":..}}`, `{"error":".."}` and `{"message":..}`;
/// anything else is returned trimmed as-is.
pub(crate) fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.to_string();
    };
    let message = json
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|v| v.as_str())
        .or_else(|| json.get("message").and_then(|v| v.as_str()));
    match message {
        Some(m) => m.to_string(),
        None => trimmed.to_string(),
    }
}

/// Whether a rejected status/delete call means the task id is unknown.
///
/// The service answers 404 for most unknown ids, but some deployments use
/// 400 with a "not found" message instead.
pub(crate) fn is_task_not_found(status: u16, message: &str) -> bool {
    if status == 404 {
        return true;
    }
    if status != 400 {
        return false;
    }
    let m = message.to_lowercase();
    m.contains("task") && (m.contains("not found") || m.contains("does not exist"))
}
