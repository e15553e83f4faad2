//! HTTP response building module
//!
//! Builders for the status codes the relay emits. Builders never panic: a
//! failed build is logged and replaced by an empty response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type HttpResponse = Response<Full<Bytes>>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Attach the permissive cross-origin headers every response carries
pub fn apply_cors(mut response: HttpResponse) -> HttpResponse {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Attach the `Server` header
pub fn apply_server_name(mut response: HttpResponse, server_name: &str) -> HttpResponse {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        response.headers_mut().insert(SERVER, value);
    }
    response
}

/// Plain-text response
pub fn build_text_response(status: StatusCode, text: impl Into<String>) -> HttpResponse {
    let text = text.into();
    Response::builder()
        .status(status)
        .header("Content-Type", TEXT_PLAIN)
        .header("Content-Length", text.len())
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// JSON response, UTF-8 without ASCII escaping
pub fn build_json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HttpResponse {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", APPLICATION_JSON)
        .header("Content-Length", json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Response with no body (CORS preflight)
pub fn build_empty_response(status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Redirect with an explicit status code and no body
pub fn build_redirect_response_with_code(target: &str, status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("Location", target)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Static file response with `Last-Modified`
pub fn build_file_response(
    data: Vec<u8>,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> HttpResponse {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(data) };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);
    if let Some(date) = last_modified {
        builder = builder.header("Last-Modified", date);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("Last-Modified", last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

pub fn build_403_response(message: &str) -> HttpResponse {
    build_text_response(StatusCode::FORBIDDEN, message)
}

pub fn build_404_response(message: &str) -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, message)
}

pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build 501 Not Implemented response for unsupported methods
pub fn build_501_response(method: &str) -> HttpResponse {
    build_text_response(
        StatusCode::NOT_IMPLEMENTED,
        format!("Unsupported method ({method})"),
    )
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_cors() {
        let resp = apply_cors(build_404_response("nope"));
        let headers = resp.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    }

    #[test]
    fn test_head_file_response_keeps_length() {
        let resp = build_file_response(b"<html></html>".to_vec(), "text/html", None, true);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "13");
    }

    #[test]
    fn test_redirect_has_location() {
        let resp = build_redirect_response_with_code("/weather.html", StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["location"], "/weather.html");
    }
}
