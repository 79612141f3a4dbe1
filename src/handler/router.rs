//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS, method and body size
//! checks, route matching, access logging.

use crate::config::AppState;
use crate::handler::cors::{self, CorsDecision};
use crate::handler::{frontend, static_files, upload};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context for the read-only handlers
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Where a request path leads
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Upload,
    Index,
    /// Embedded page, path below `html/`
    Page(String),
    /// Stored image, decoded path below the storage root
    Stored(String),
    NotFound,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body + Send + 'static,
    B::Data: Into<Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr));

    let cors = cors::check_origin(&state.config.cors, req.headers());
    let is_preflight = req.method() == Method::OPTIONS;
    let mut response = dispatch(req, &state, &cors).await;

    if let CorsDecision::Allowed(origin) = &cors {
        if is_preflight {
            cors::apply_preflight_headers(&mut response, &state.config.cors, origin);
        } else {
            cors::apply_headers(&mut response, &state.config.cors, origin);
        }
    }
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(header::SERVER, server);
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState, cors: &CorsDecision) -> HttpResponse
where
    B: Body + Send + 'static,
    B::Data: Into<Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if *cors == CorsDecision::Forbidden {
        logger::log_warning(&format!(
            "Cross-origin request refused: {:?}",
            req.headers().get(header::ORIGIN)
        ));
        return http::build_403_response();
    }

    let method = req.method().clone();
    if method == Method::OPTIONS {
        return http::build_preflight_response();
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    let route = resolve_route(req.uri().path(), &state.config.storage.public_path);
    match (&method, route) {
        (_, Route::NotFound) => http::build_404_response(),
        (&Method::POST, Route::Upload) => upload::handle_upload(req, state).await,
        (&Method::GET | &Method::HEAD, route) if route != Route::Upload => {
            let ctx = RequestContext {
                path: req.uri().path(),
                is_head: method == Method::HEAD,
                if_none_match: req
                    .headers()
                    .get(header::IF_NONE_MATCH)
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string),
            };
            match route {
                Route::Index => frontend::serve_page(&ctx, frontend::INDEX_PAGE),
                Route::Page(page) => frontend::serve_page(&ctx, &page),
                Route::Stored(relative) => {
                    static_files::serve_stored(&ctx, state.store.root(), &relative).await
                }
                Route::Upload | Route::NotFound => http::build_404_response(),
            }
        }
        _ => {
            logger::log_warning(&format!(
                "Method not allowed: {method} {}",
                req.uri().path()
            ));
            http::build_405_response()
        }
    }
}

fn resolve_route(path: &str, public_path: &str) -> Route {
    let decode = |raw: &str| urlencoding::decode(raw).ok().map(|s| s.into_owned());
    let mount = public_path.trim_end_matches('/');

    if path == "/upload" {
        return Route::Upload;
    }
    if path == "/" {
        return Route::Index;
    }
    if let Some(page) = path.strip_prefix("/html/") {
        return decode(page).map_or(Route::NotFound, Route::Page);
    }
    if let Some(relative) = path.strip_prefix(mount).and_then(|r| r.strip_prefix('/')) {
        return decode(relative).map_or(Route::NotFound, Route::Stored);
    }
    Route::NotFound
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<HttpResponse> {
    let content_length = req.headers().get(header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header_string = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_string(header::REFERER);
    entry.user_agent = header_string(header::USER_AGENT);
    entry
}
