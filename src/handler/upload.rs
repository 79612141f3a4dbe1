//! `POST /upload` endpoint
//!
//! Pulls the `file` part out of a multipart body, hands it to the upload
//! core and wraps the outcome in the JSON envelope.

use chrono::Local;
use hyper::body::{Body, Bytes};
use hyper::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;

use crate::config::{AppState, UploadConfig};
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::upload::{self, StoredImage, UploadError, UploadedFile};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct UploadResponse<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UploadData>,
}

/// Where the stored image can be fetched
#[derive(Debug, Serialize)]
pub struct UploadData {
    pub name: String,
    pub url: String,
}

/// Handle an upload request end to end
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body + Send + 'static,
    B::Data: Into<Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let settings = &state.config.upload;

    let upload = match extract(req, settings).await {
        Ok(u) => u,
        Err(e) => return error_response(&e, None),
    };

    let today = Local::now().date_naive();
    match upload::process_upload(&upload, settings, &state.store, today).await {
        Ok(stored) => {
            logger::log_upload_stored(&stored, upload.declared_size());
            success_response(settings, &stored)
        }
        Err(e) => error_response(&e, Some(upload.file_name())),
    }
}

async fn extract<B>(req: Request<B>, settings: &UploadConfig) -> Result<UploadedFile, UploadError>
where
    B: Body + Send + 'static,
    B::Data: Into<Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            UploadError::Extraction("request Content-Type isn't multipart/form-data".to_string())
        })?;
    let boundary = multer::parse_boundary(content_type)?;

    let stream = req.into_body().into_data_stream();
    let mut multipart = multer::Multipart::new(stream, boundary);
    upload::extract_file(
        &mut multipart,
        settings.max_file_size,
        &settings.messages.too_large,
    )
    .await
}

fn success_response(settings: &UploadConfig, stored: &StoredImage) -> HttpResponse {
    let data = settings.return_url.then(|| UploadData {
        name: stored.name.clone(),
        url: public_url(&settings.url_prefix, &stored.public_path),
    });
    http::build_json_response(
        StatusCode::OK,
        &UploadResponse {
            message: &settings.messages.success,
            data,
        },
    )
}

fn error_response(err: &UploadError, file_name: Option<&str>) -> HttpResponse {
    let status = err.status();
    let message = err.to_string();
    logger::log_upload_rejected(file_name, status.as_u16(), &message);
    http::build_error_response(status, &message)
}

/// `prefix + path`, with each path segment percent-encoded
pub fn public_url(prefix: &str, path: &str) -> String {
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("{prefix}{}", encoded.join("/"))
}
