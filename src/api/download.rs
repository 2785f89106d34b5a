//! Proxy download endpoint.
//!
//! Fetches the source named by `u` and relays it as an attachment without
//! buffering the body.

use actix_web::body::SizedStream;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, get, web};
use futures_util::TryStreamExt;
use tracing::{debug, info, warn};
use url::Url;
use url::form_urlencoded;

use crate::error::DownloadError;
use crate::services::Downloader;
use crate::services::download::decode_target;
use crate::services::filename::{attachment_disposition, resolve_filename};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Download a remote file through the proxy.
///
/// `u` is the base64 of the absolute source URL, percent-encoded.
#[utoipa::path(
    get,
    path = "/api/download",
    tag = "Download",
    params(
        ("u" = String, Query, description = "Percent-encoded base64 of an absolute http(s) URL")
    ),
    responses(
        (status = 200, description = "Streamed file body", content_type = "application/octet-stream"),
        (status = 400, description = "Missing param 'u' | Invalid URL encoding | Only http/https allowed | Forbidden host", body = String, content_type = "text/plain"),
        (status = 502, description = "Failed to fetch source", body = String, content_type = "text/plain")
    )
)]
#[get("/download")]
pub async fn download(
    req: HttpRequest,
    downloader: web::Data<Downloader>,
) -> Result<HttpResponse, DownloadError> {
    // First occurrence wins, like URLSearchParams::get
    let param = form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.into_owned());

    let target = decode_target(param.as_deref()).inspect_err(|e| {
        warn!("Rejected download request: {}", e);
    })?;

    let upstream = downloader.fetch(&target).await?;
    stream_attachment(&target, upstream)
}

/// Relay an upstream response as an attachment.
fn stream_attachment(
    target: &Url,
    upstream: reqwest::Response,
) -> Result<HttpResponse, DownloadError> {
    let headers = upstream.headers();

    let disposition = headers
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok());
    let filename = resolve_filename(target, disposition);

    let content_type = headers
        .get(reqwest::header::CONTENT_TYPE)
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let content_length = headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let disposition = HeaderValue::from_str(&attachment_disposition(&filename)).map_err(|e| {
        warn!("Unusable attachment filename {:?}: {}", filename, e);
        DownloadError::Upstream
    })?;

    info!(
        "Streaming {} from {} ({} bytes)",
        filename,
        target.host_str().unwrap_or_default(),
        content_length.map_or_else(|| "unknown".to_string(), |len| len.to_string())
    );

    let host = target.host_str().unwrap_or_default().to_string();
    let body = upstream.bytes_stream().inspect_err(move |e| {
        warn!("Upstream body from {} failed mid-stream: {}", host, e);
    });

    let mut response = HttpResponse::Ok();
    response
        .insert_header((header::CONTENT_DISPOSITION, disposition))
        .insert_header((header::CONTENT_TYPE, content_type));

    Ok(match content_length {
        Some(len) => response.body(SizedStream::new(len, body)),
        None => {
            debug!("Upstream sent no Content-Length, streaming chunked");
            response.streaming(body)
        }
    })
}

/// Configure download routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(download);
}
