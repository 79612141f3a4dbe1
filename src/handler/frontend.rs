//! Embedded front-end pages
//!
//! `GET /` and `GET /html/*` are served from `html/`, compiled into the binary.

use hyper::body::Bytes;
use rust_embed::RustEmbed;
use std::borrow::Cow;

use crate::handler::router::RequestContext;
use crate::handler::static_files::build_cached_file_response;
use crate::http::cache::CachePolicy;
use crate::http::{self, mime, HttpResponse};

#[derive(RustEmbed)]
#[folder = "html/"]
struct Pages;

pub const INDEX_PAGE: &str = "index.html";

/// Serve an embedded page by its path below `html/`
pub fn serve_page(ctx: &RequestContext<'_>, relative: &str) -> HttpResponse {
    let relative = relative.trim_start_matches('/');
    let relative = if relative.is_empty() || relative.ends_with('/') {
        Cow::Owned(format!("{relative}{INDEX_PAGE}"))
    } else {
        Cow::Borrowed(relative)
    };

    let Some(page) = Pages::get(&relative) else {
        return http::build_404_response();
    };
    let data = match page.data {
        Cow::Borrowed(b) => Bytes::from_static(b),
        Cow::Owned(v) => Bytes::from(v),
    };
    let content_type = mime::content_type_for(&relative, &data);
    build_cached_file_response(ctx, data, content_type, CachePolicy::PAGES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    fn ctx() -> RequestContext<'static> {
        RequestContext {
            path: "/",
            is_head: false,
            if_none_match: None,
        }
    }

    #[test]
    fn test_index_is_embedded() {
        let resp = serve_page(&ctx(), "");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(resp.headers()["cache-control"], "no-cache");
    }

    #[test]
    fn test_missing_page() {
        assert_eq!(
            serve_page(&ctx(), "/nope.html").status(),
            StatusCode::NOT_FOUND
        );
    }
}
