//! Common types used throughout the middleware chain.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type used in the middleware chain.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The finished HTTP response handed back to the host server.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// Builds a JSON error response.
///
/// ```
/// use heron_middleware::types::json_error;
/// use http::StatusCode;
///
/// let response = json_error(StatusCode::BAD_GATEWAY, "UPSTREAM", "upstream failed");
/// assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
/// ```
pub fn json_error(status: http::StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = serde_json::json!({
        "error": {
            "code": code,
            "message": message
        }
    });

    let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
