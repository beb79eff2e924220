use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::codes;

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Page metadata returned alongside list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub limit: u32,
    pub offset: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// `{success, data, pagination}` with `data` decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Normalized error fields pulled out of a failed response body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Extract `code`/`message`/`details` from an error response.
    ///
    /// Accepts `{"error": {...}}`, `{"error": "text"}`, or a bare
    /// `{code, message}` object. Anything else becomes `HTTP_<status>`.
    pub(crate) fn extract(status: StatusCode, body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return Self::from_status(status);
        };
        match value.get("error") {
            Some(Value::Object(inner)) => Self::from_fields(
                inner.get("code"),
                inner.get("message"),
                inner.get("details"),
            ),
            Some(Value::String(message)) => Self {
                code: codes::UNKNOWN_ERROR.into(),
                message: message.clone(),
                details: None,
            },
            _ if value.get("code").is_some() || value.get("message").is_some() => {
                Self::from_fields(value.get("code"), value.get("message"), value.get("details"))
            }
            _ => Self::from_status(status),
        }
    }

    fn from_fields(code: Option<&Value>, message: Option<&Value>, details: Option<&Value>) -> Self {
        let code = code
            .and_then(Value::as_str)
            .filter(|code| !code.is_empty())
            .unwrap_or(codes::UNKNOWN_ERROR);
        let message = message
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_ERROR_MESSAGE);
        Self {
            code: code.to_owned(),
            message: message.to_owned(),
            details: details.filter(|details| !details.is_null()).cloned(),
        }
    }

    fn from_status(status: StatusCode) -> Self {
        Self {
            code: format!("HTTP_{}", status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_owned(),
            details: None,
        }
    }
}

/// Pull `data` out of a success envelope. A body without `data` yields `Null`.
pub(crate) fn take_data(envelope: &mut Value) -> Value {
    envelope
        .as_object_mut()
        .and_then(|object| object.remove("data"))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn nested_error_envelope() {
        let body = bytes(&json!({
            "success": false,
            "error": {"code": "INSUFFICIENT_WORDS", "message": "need more", "details": {"have": 2}}
        }));
        let err = ErrorBody::extract(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.code, "INSUFFICIENT_WORDS");
        assert_eq!(err.message, "need more");
        assert_eq!(err.details, Some(json!({"have": 2})));
    }

    #[test]
    fn nested_error_without_fields_uses_defaults() {
        let body = bytes(&json!({"error": {}}));
        let err = ErrorBody::extract(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.code, codes::UNKNOWN_ERROR);
        assert_eq!(err.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn raw_error_body() {
        let body = bytes(&json!({"code": "TOKEN_EXPIRED", "message": "expired"}));
        let err = ErrorBody::extract(StatusCode::UNAUTHORIZED, &body);
        assert_eq!(err.code, "TOKEN_EXPIRED");
        assert_eq!(err.message, "expired");
    }

    #[test]
    fn non_json_body_falls_back_to_status() {
        let err = ErrorBody::extract(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.code, "HTTP_502");
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn missing_data_is_null() {
        let mut envelope = json!({"success": true});
        assert_eq!(take_data(&mut envelope), Value::Null);
        let mut envelope = json!({"success": true, "data": [1, 2]});
        assert_eq!(take_data(&mut envelope), json!([1, 2]));
    }

    #[test]
    fn pagination_reads_camel_case() {
        let pagination: Pagination = serde_json::from_value(json!({
            "page": 2, "pageSize": 20, "total": 41, "totalPages": 3,
            "limit": 20, "offset": 20, "hasNext": true, "hasPrev": true
        }))
        .unwrap();
        assert_eq!(pagination.page_size, 20);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next && pagination.has_prev);
    }
}
