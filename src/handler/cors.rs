//! Cross-origin request handling
//!
//! Policy: exact origin allow-list (`*` allows any), methods `GET, POST`,
//! request header `Origin`, exposed header `Content-Length`, credentials
//! and a 12 hour preflight cache by default. Disallowed origins get 403.

use hyper::header::{self, HeaderMap, HeaderValue};

use crate::config::CorsConfig;
use crate::http::HttpResponse;

const ALLOW_METHODS: &str = "GET, POST";
const ALLOW_HEADERS: &str = "Origin";
const EXPOSE_HEADERS: &str = "Content-Length";

/// Outcome of checking a request's `Origin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No `Origin`, or the page is served from this host
    NotCrossOrigin,
    /// Cross-origin and allowed; carries the origin to echo back
    Allowed(HeaderValue),
    Forbidden,
}

/// Classify a request by its `Origin` and `Host` headers
pub fn check_origin(cfg: &CorsConfig, headers: &HeaderMap) -> CorsDecision {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return CorsDecision::NotCrossOrigin;
    };
    let Ok(origin_str) = origin.to_str() else {
        return CorsDecision::Forbidden;
    };

    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    if let Some(host) = host {
        if origin_str == format!("http://{host}") || origin_str == format!("https://{host}") {
            return CorsDecision::NotCrossOrigin;
        }
    }

    if cfg
        .allow_origins
        .iter()
        .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin_str))
    {
        CorsDecision::Allowed(origin.clone())
    } else {
        CorsDecision::Forbidden
    }
}

/// Headers for an allowed actual (non-preflight) request
pub fn apply_headers(resp: &mut HttpResponse, cfg: &CorsConfig, origin: &HeaderValue) {
    let headers = resp.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    if cfg.allow_credentials {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

/// Headers for an allowed preflight request
pub fn apply_preflight_headers(resp: &mut HttpResponse, cfg: &CorsConfig, origin: &HeaderValue) {
    let headers = resp.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    if cfg.allow_credentials {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(cfg.max_age_secs));
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_preflight_response;

    fn cors(origins: &[&str]) -> CorsConfig {
        CorsConfig {
            allow_origins: origins.iter().map(ToString::to_string).collect(),
            allow_credentials: true,
            max_age_secs: 43_200,
        }
    }

    fn headers(origin: Option<&'static str>, host: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::HOST, HeaderValue::from_static(host));
        if let Some(o) = origin {
            map.insert(header::ORIGIN, HeaderValue::from_static(o));
        }
        map
    }

    #[test]
    fn test_no_origin_is_not_cors() {
        let decision = check_origin(&cors(&[]), &headers(None, "img.example.com"));
        assert_eq!(decision, CorsDecision::NotCrossOrigin);
    }

    #[test]
    fn test_same_host_is_not_cors() {
        let decision = check_origin(
            &cors(&[]),
            &headers(Some("http://img.example.com"), "img.example.com"),
        );
        assert_eq!(decision, CorsDecision::NotCrossOrigin);
    }

    #[test]
    fn test_allow_list() {
        let cfg = cors(&["https://blog.example.com"]);
        assert!(matches!(
            check_origin(&cfg, &headers(Some("https://blog.example.com"), "img.example.com")),
            CorsDecision::Allowed(_)
        ));
        assert_eq!(
            check_origin(&cfg, &headers(Some("https://evil.example"), "img.example.com")),
            CorsDecision::Forbidden
        );
    }

    #[test]
    fn test_wildcard() {
        let cfg = cors(&["*"]);
        assert!(matches!(
            check_origin(&cfg, &headers(Some("https://anything.example"), "img.example.com")),
            CorsDecision::Allowed(_)
        ));
    }

    #[test]
    fn test_preflight_headers() {
        let cfg = cors(&["https://blog.example.com"]);
        let origin = HeaderValue::from_static("https://blog.example.com");
        let mut resp = build_preflight_response();
        apply_preflight_headers(&mut resp, &cfg, &origin);

        let h = resp.headers();
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://blog.example.com");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_HEADERS], "Origin");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(h[header::ACCESS_CONTROL_MAX_AGE], "43200");
    }
}
