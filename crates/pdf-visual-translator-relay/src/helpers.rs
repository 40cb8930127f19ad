//! Helper types and traits for cleaner route handlers.
//!
//! Every relay failure is a JSON body with at least an `error` field, so
//! the caller can always parse what it gets back.

use axum::Json;
use axum::http::StatusCode;
use pdf_visual_translator_core::remediation_hint;
use pdf_visual_translator_core::util::preview;
use serde_json::{Value, json};

/// Characters of a bad upstream body echoed back to the caller.
pub const RAW_PREVIEW_CHARS: usize = 200;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 401 Unauthorized error.
    fn or_unauthorized(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_unauthorized(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self, msg: &str) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_bad_request(self, msg: &str) -> RouteResult<T> {
        self.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": msg, "message": e.to_string() })),
            )
        })
    }
}

/// Remediation hint for an upstream status; `0` means no response at all.
pub const fn upstream_hint(status: u16) -> &'static str {
    if status == 0 {
        "Check that the relay can reach the upstream API"
    } else {
        remediation_hint(status)
    }
}

/// Body sent when the upstream answer cannot be forwarded as-is.
///
/// `status` is the upstream HTTP status, or `0` when the upstream could not
/// be reached.
pub fn normalized_failure(status: u16, message: &str, raw: &str) -> Value {
    json!({
        "error": "Invalid response from upstream API",
        "message": message,
        "status": status,
        "rawResponsePreview": preview(raw, RAW_PREVIEW_CHARS),
        "hint": upstream_hint(status),
    })
}

/// [`normalized_failure`] as a 502 route error.
pub fn bad_gateway(status: u16, message: &str, raw: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_GATEWAY, Json(normalized_failure(status, message, raw)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_failure_shape() {
        let raw = "x".repeat(500);
        let body = normalized_failure(504, "not JSON", &raw);

        assert_eq!(body["status"], 504);
        assert_eq!(body["message"], "not JSON");
        assert_eq!(body["rawResponsePreview"].as_str().map(str::len), Some(RAW_PREVIEW_CHARS));
        assert_eq!(body["hint"], remediation_hint(504));
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_hints() {
        assert!(upstream_hint(0).contains("reach"));
        assert!(upstream_hint(401).contains("API key"));
        assert!(upstream_hint(429).contains("Rate limited"));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<&str> = None;
        let (status, Json(body)) = missing.or_unauthorized("API key missing").unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "API key missing" }));
    }
}
