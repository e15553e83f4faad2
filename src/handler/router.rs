//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, route matching,
//! CORS headers and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, StatusCode};

use crate::config::AppState;
use crate::handler::{chat, outfit, static_files};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

const OUTFIT_PREFIX: &str = "/api/ai";
const CHAT_PREFIX: &str = "/api/chat";

/// Request information the static responder needs
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let max_body_size = state.config.http.max_body_size;

    let response = match check_body_size(&parts.headers, max_body_size) {
        Some(resp) => finish(resp, &state),
        None => match read_body(body, max_body_size).await {
            Ok(bytes) => dispatch(&parts, bytes, &state).await,
            Err(resp) => finish(resp, &state),
        },
    };

    if state.access_log() {
        log_access(&parts, &response, remote_addr, started, &state);
    }
    Ok(response)
}

/// Route a request whose body has already been read.
///
/// Every response leaving here carries the CORS headers.
pub async fn dispatch(parts: &Parts, body: Bytes, state: &AppState) -> HttpResponse {
    let response = route(parts, &body, state).await;
    finish(response, state)
}

async fn route(parts: &Parts, body: &[u8], state: &AppState) -> HttpResponse {
    let path = parts.uri.path();
    let method = &parts.method;

    match *method {
        Method::OPTIONS => http::build_empty_response(StatusCode::OK),
        Method::GET if path.starts_with(OUTFIT_PREFIX) => {
            outfit::handle(parts.uri.query(), state).await
        }
        Method::GET if path == "/" => http::build_redirect_response_with_code(
            &state.config.static_files.index_redirect,
            StatusCode::MOVED_PERMANENTLY,
        ),
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path,
                query: parts.uri.query(),
                is_head: *method == Method::HEAD,
                if_modified_since: parts
                    .headers
                    .get("if-modified-since")
                    .and_then(|v| v.to_str().ok()),
            };
            static_files::serve(&ctx, &state.config.static_files).await
        }
        Method::POST if path.starts_with(CHAT_PREFIX) => chat::handle(body, state).await,
        Method::POST => http::build_404_response("Endpoint not found"),
        _ => {
            logger::log_warning(&format!("Unsupported method: {method}"));
            http::build_501_response(method.as_str())
        }
    }
}

fn finish(response: HttpResponse, state: &AppState) -> HttpResponse {
    http::apply_server_name(http::apply_cors(response), &state.config.http.server_name)
}

/// Reject a declared Content-Length above the limit before reading anything
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            _ => None,
        },
    )
}

/// Read the whole body, enforcing the limit for chunked uploads too
async fn read_body(body: Incoming, max_body_size: u64) -> Result<Bytes, HttpResponse> {
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_text_response(
                StatusCode::BAD_REQUEST,
                "Bad Request",
            ))
        }
    }
}

fn log_access(
    parts: &Parts,
    response: &HttpResponse,
    remote_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let mut entry = AccessLogEntry::new(remote_addr.ip().to_string(), parts.method.to_string(), target);
    entry.http_version = match parts.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = header_string(&parts.headers, "referer");
    entry.user_agent = header_string(&parts.headers, "user-agent");
    entry.elapsed = started.elapsed();

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
