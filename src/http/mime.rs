//! MIME type detection module
//!
//! Content-Type from the file extension, with a content sniff fallback.

use crate::upload::sniff;

/// Get MIME Content-Type based on file extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let lower = extension.map(str::to_ascii_lowercase);
    match lower.as_deref() {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg" | "jfif") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("avif") => "image/avif",
        Some("heic" | "heif") => "image/heif",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        _ => "application/octet-stream",
    }
}

/// Content-Type for a served file.
///
/// Minified bundles get an explicit script/style type; other files use the
/// extension table and fall back to sniffing `data`.
pub fn content_type_for(path: &str, data: &[u8]) -> &'static str {
    if path.ends_with(".min.js") {
        return "text/javascript;charset=UTF-8";
    }
    if path.ends_with(".min.css") {
        return "text/css;charset=UTF-8";
    }

    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str());
    match get_content_type(extension) {
        "application/octet-stream" => detect_content_type(data),
        known => known,
    }
}

/// Guess a Content-Type from leading bytes
pub fn detect_content_type(data: &[u8]) -> &'static str {
    if let Some(kind) = sniff::detect(data) {
        return kind.mime();
    }

    let head = &data[..data.len().min(512)];
    let trimmed = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(&[][..], |i| &head[i..]);
    if starts_with_ignore_case(trimmed, b"<!doctype html")
        || starts_with_ignore_case(trimmed, b"<html")
    {
        return "text/html; charset=utf-8";
    }
    if data.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if !head.is_empty() && std::str::from_utf8(head).is_ok() && !head.contains(&0) {
        return "text/plain; charset=utf-8";
    }
    "application/octet-stream"
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && data[..prefix.len()].eq_ignore_ascii_case(prefix)
}
