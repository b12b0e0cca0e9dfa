//! Response envelope and numeric error codes for the HTTP surface.
//!
//! Every response carries `{"code": 0, "data": ...}` on success or
//! `{"code": N, "message": ...}` on failure, with the numeric code
//! mirrored into a `Code` response header and the caller's `Req-ID`
//! echoed back. Failures ride on HTTP 200: the protocol's error channel
//! is the envelope, not the status line.

use axum::Json;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::core::StoreError;

pub const CODE_OK: i32 = 0;
pub const CODE_WRONG_METHOD: i32 = 1010;
pub const CODE_MISSING_HEADER: i32 = 1011;
pub const CODE_BODY_READ: i32 = 1013;
pub const CODE_BAD_BODY: i32 = 1014;
pub const CODE_STORAGE: i32 = 1015;
pub const CODE_TOKEN: i32 = 1016;

pub const HEADER_DEVICE_ID: &str = "Device-ID";
pub const HEADER_REQ_ID: &str = "Req-ID";

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Build the success response: code 0 in body and header, `Req-ID` echoed.
pub fn success<T: Serialize>(req_id: &str, data: T) -> Response {
    let body = Envelope {
        code: CODE_OK,
        message: None,
        data: Some(data),
    };
    stamp_headers(Json(body).into_response(), CODE_OK, Some(req_id))
}

/// A failed request, carrying its numeric protocol code.
#[derive(Debug)]
pub struct ApiFailure {
    pub code: i32,
    pub message: String,
    pub req_id: Option<String>,
}

impl ApiFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            req_id: None,
        }
    }

    pub fn wrong_method() -> Self {
        Self::new(CODE_WRONG_METHOD, "Method not allowed")
    }

    pub fn missing_headers() -> Self {
        Self::new(CODE_MISSING_HEADER, "Missing required headers")
    }

    pub fn body_read() -> Self {
        Self::new(CODE_BODY_READ, "Failed to read request body")
    }

    pub fn bad_body() -> Self {
        Self::new(CODE_BAD_BODY, "Invalid request format")
    }

    /// Attach the request id to echo back, when the caller supplied one.
    pub fn with_req_id(mut self, req_id: Option<String>) -> Self {
        self.req_id = req_id;
        self
    }
}

impl From<StoreError> for ApiFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Token(_) => Self::new(CODE_TOKEN, "Failed to generate token"),
            _ => Self::new(CODE_STORAGE, "Player storage failure"),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            code: self.code,
            message: Some(self.message),
            data: None,
        };
        stamp_headers(
            Json(body).into_response(),
            self.code,
            self.req_id.as_deref(),
        )
    }
}

fn stamp_headers(mut response: Response, code: i32, req_id: Option<&str>) -> Response {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&code.to_string()) {
        headers.insert(HeaderName::from_static("code"), value);
    }
    if let Some(req_id) = req_id {
        if let Ok(value) = HeaderValue::from_str(req_id) {
            headers.insert(HeaderName::from_static("req-id"), value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::{ApiFailure, CODE_STORAGE, CODE_TOKEN, Envelope, success};
    use crate::core::StoreError;
    use axum::response::IntoResponse;

    #[test]
    fn envelope_omits_absent_fields() {
        let failure = Envelope::<()> {
            code: 1011,
            message: Some("Missing required headers".to_string()),
            data: None,
        };
        let json = serde_json::to_string(&failure).unwrap();
        assert_eq!(json, r#"{"code":1011,"message":"Missing required headers"}"#);

        let ok = Envelope {
            code: 0,
            message: None,
            data: Some(42),
        };
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"code":0,"data":42}"#);
    }

    #[test]
    fn failure_response_mirrors_code_and_echoes_req_id() {
        let response = ApiFailure::missing_headers()
            .with_req_id(Some("req-7".to_string()))
            .into_response();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("code").unwrap(), "1011");
        assert_eq!(response.headers().get("req-id").unwrap(), "req-7");
    }

    #[test]
    fn success_response_carries_code_zero() {
        let response = success("req-1", "payload");
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("code").unwrap(), "0");
        assert_eq!(response.headers().get("req-id").unwrap(), "req-1");
    }

    #[test]
    fn store_errors_map_to_protocol_codes() {
        let io = ApiFailure::from(StoreError::Io("disk gone".to_string()));
        assert_eq!(io.code, CODE_STORAGE);

        let token = ApiFailure::from(StoreError::Token("boom".to_string()));
        assert_eq!(token.code, CODE_TOKEN);
    }
}
