//! Static file serving module
//!
//! Serves the front end from the document root. A directory path without a
//! trailing slash is redirected to the slashed form; directories are then
//! served through their index file, and without one the request gets a 403,
//! never a generated listing.

use std::path::{Path, PathBuf};

use hyper::StatusCode;
use percent_encoding::percent_decode_str;
use tokio::fs;

use crate::config::StaticFilesConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, HttpResponse};
use crate::logger;

const NOT_FOUND: &str = "File not found";
const LISTING_DISABLED: &str = "Directory listing disabled";

/// Outcome of mapping a request path onto the document root
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory requested without its trailing slash
    Redirect,
    /// Directory with no index file
    Directory,
    NotFound,
}

/// Serve a file below the document root
pub async fn serve(ctx: &RequestContext<'_>, config: &StaticFilesConfig) -> HttpResponse {
    let path = match resolve(&config.root, ctx.path, &config.index_files).await {
        Resolved::File(path) => path,
        Resolved::Redirect => {
            return http::build_redirect_response_with_code(
                &slashed_location(ctx.path, ctx.query),
                StatusCode::MOVED_PERMANENTLY,
            )
        }
        Resolved::Directory => return http::build_403_response(LISTING_DISABLED),
        Resolved::NotFound => return http::build_404_response(NOT_FOUND),
    };

    let modified = fs::metadata(&path)
        .await
        .ok()
        .and_then(|meta| meta.modified().ok());
    let last_modified = modified.map(cache::http_date);

    if let (Some(modified), Some(date)) = (modified, last_modified.as_deref()) {
        if cache::not_modified_since(ctx.if_modified_since, modified) {
            return http::build_304_response(date);
        }
    }

    let content = match fs::read(&path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response(NOT_FOUND);
        }
    };

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    http::build_file_response(content, content_type, last_modified.as_deref(), ctx.is_head)
}

/// `path/` with the original query string kept
fn slashed_location(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    }
}

/// Percent-decode a request path into root-relative segments.
///
/// Empty, `.` and `..` segments are dropped, so the result never climbs
/// above the root.
fn relative_segments(request_path: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    Some(
        decoded
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != "." && *seg != ".." && !seg.contains('\\'))
            .map(ToString::to_string)
            .collect(),
    )
}

/// Map a request path to a file below `root`
pub async fn resolve(root: &str, request_path: &str, index_files: &[String]) -> Resolved {
    let Some(segments) = relative_segments(request_path) else {
        return Resolved::NotFound;
    };

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Document root not found or inaccessible '{root}': {e}"
            ));
            return Resolved::NotFound;
        }
    };

    let mut candidate = segments
        .iter()
        .fold(PathBuf::from(root), |path, seg| path.join(seg));

    let Ok(meta) = fs::metadata(&candidate).await else {
        return Resolved::NotFound;
    };

    if meta.is_dir() {
        if !request_path.ends_with('/') {
            return Resolved::Redirect;
        }
        match find_index(&candidate, index_files).await {
            Some(index) => candidate = index,
            None => return Resolved::Directory,
        }
    } else if request_path.ends_with('/') {
        // "/weather.html/" names a directory that does not exist
        return Resolved::NotFound;
    }

    match fs::canonicalize(&candidate).await {
        Ok(canonical) if canonical.starts_with(&root_canonical) => Resolved::File(canonical),
        Ok(canonical) => {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {request_path} -> {}",
                canonical.display()
            ));
            Resolved::NotFound
        }
        Err(_) => Resolved::NotFound,
    }
}

async fn find_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let path = dir.join(name);
        if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            return Some(path);
        }
    }
    None
}
