//! Stored image serving module
//!
//! `GET /static/*`: raw bytes from the storage root with `ETag` support.

use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::cache::{self, CachePolicy};
use crate::http::{self, mime, HttpResponse};
use crate::logger;
use crate::upload::storage::TEMP_PREFIX;

/// Serve a stored file below `root`; `relative` is the decoded path after the mount
pub async fn serve_stored(ctx: &RequestContext<'_>, root: &Path, relative: &str) -> HttpResponse {
    let Some(file_path) = resolve(root, relative) else {
        return http::build_404_response();
    };

    let data = match fs::read(&file_path).await {
        Ok(d) => d,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response();
        }
    };

    let content_type = mime::content_type_for(relative, &data);
    build_cached_file_response(ctx, Bytes::from(data), content_type, CachePolicy::IMAGES)
}

/// Map `relative` onto a regular file inside `root`.
///
/// Refuses traversal out of the root, directories and in-flight upload
/// temporaries.
fn resolve(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty()
        || relative
            .split('/')
            .any(|seg| seg == ".." || seg.starts_with(TEMP_PREFIX))
    {
        return None;
    }

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_debug(&format!(
                "Storage root '{}' not accessible: {e}",
                root.display()
            ));
            return None;
        }
    };

    // Missing files are the common 404, not worth logging
    let file_canonical = root.join(relative).canonicalize().ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            file_canonical.display()
        ));
        return None;
    }
    file_canonical.is_file().then_some(file_canonical)
}

/// 200 with `ETag`, or 304 when the client already holds this version
pub fn build_cached_file_response(
    ctx: &RequestContext<'_>,
    data: Bytes,
    content_type: &str,
    policy: CachePolicy,
) -> HttpResponse {
    let etag = cache::generate_etag(&data);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        logger::log_debug(&format!("Not modified: {}", ctx.path));
        return http::build_304_response(&etag, policy);
    }
    http::build_file_response(data, content_type, &etag, policy, ctx.is_head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use tempfile::TempDir;

    fn ctx(if_none_match: Option<String>) -> RequestContext<'static> {
        RequestContext {
            path: "/static/2024/3/5/pic.png",
            is_head: false,
            if_none_match,
        }
    }

    fn store_with_png() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("2024/3/5");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pic.png"), b"\x89PNG\r\n\x1a\n....").unwrap();
        std::fs::write(dir.join(format!("{TEMP_PREFIX}abc")), b"partial").unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_serves_stored_file() {
        let tmp = store_with_png();
        let resp = serve_stored(&ctx(None), tmp.path(), "2024/3/5/pic.png").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");
        assert!(resp.headers().contains_key("etag"));
    }

    #[tokio::test]
    async fn test_if_none_match_gives_304() {
        let tmp = store_with_png();
        let first = serve_stored(&ctx(None), tmp.path(), "2024/3/5/pic.png").await;
        let etag = first.headers()["etag"].to_str().unwrap().to_string();

        let second = serve_stored(&ctx(Some(etag)), tmp.path(), "2024/3/5/pic.png").await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_refuses_traversal_dirs_and_temporaries() {
        let tmp = store_with_png();
        let temporary = format!("2024/3/5/{TEMP_PREFIX}abc");
        for path in [
            "../etc/passwd",
            "2024/3/5/../../../../etc/passwd",
            "2024/3/5",
            "",
            temporary.as_str(),
            "2024/3/5/missing.png",
        ] {
            let resp = serve_stored(&ctx(None), tmp.path(), path).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "path {path:?}");
        }
    }
}
