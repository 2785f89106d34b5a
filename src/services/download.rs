//! Download proxy: target decoding, validation and the upstream fetch.
//!
//! The `u` parameter carries the source URL as base64, percent-encoded for
//! the query string. Only absolute http(s) URLs are fetched, and only a
//! literal loopback denylist is enforced: hostnames are not resolved and
//! private ranges are not checked.

use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::config::DownloadSettings;
use crate::error::{AppError, AppResult, DownloadError};

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode and validate the `u` query parameter into a fetchable URL.
///
/// `param` is the value after query-string decoding; it is percent-decoded
/// once more before the base64 step.
pub fn decode_target(param: Option<&str>) -> Result<Url, DownloadError> {
    let param = param
        .filter(|p| !p.is_empty())
        .ok_or(DownloadError::MissingParam)?;

    let decoded = urlencoding::decode(param).map_err(|_| DownloadError::InvalidEncoding)?;
    let bytes = decode_base64(&decoded).ok_or(DownloadError::InvalidEncoding)?;
    let raw = String::from_utf8_lossy(&bytes);
    let target = Url::parse(&raw).map_err(|_| DownloadError::InvalidEncoding)?;

    validate_target(target)
}

/// Check scheme and host of a parsed target.
pub fn validate_target(target: Url) -> Result<Url, DownloadError> {
    if !matches!(target.scheme(), "http" | "https") {
        return Err(DownloadError::UnsupportedScheme);
    }
    if is_blocked_host(&target) {
        return Err(DownloadError::ForbiddenHost);
    }
    Ok(target)
}

/// Literal loopback names only. `localhost.evil.com` and `10.0.0.1` pass.
pub fn is_blocked_host(target: &Url) -> bool {
    match target.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(ip)) => ip == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

/// Base64 decoding that accepts either alphabet and optional padding.
///
/// A space is read as `+`: an unencoded `+` in a query string arrives as a space.
fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    let normalized: String = encoded
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .map(|c| match c {
            ' ' | '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    LENIENT_BASE64.decode(normalized.as_bytes()).ok()
}

/// Outbound HTTP client for upstream sources.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Build the download client from settings.
    pub fn new(settings: &DownloadSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(concat!("goat-memory/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build download client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Issue the single upstream GET.
    ///
    /// Fails when the request errors, the status is not 2xx, or the status
    /// cannot carry a body.
    pub async fn fetch(&self, target: &Url) -> Result<reqwest::Response, DownloadError> {
        let host = target.host_str().unwrap_or_default();

        let response = self.client.get(target.clone()).send().await.map_err(|e| {
            warn!("Upstream request to {} failed: {}", host, e);
            DownloadError::Upstream
        })?;

        let status = response.status();
        if !status.is_success()
            || matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT)
        {
            warn!("Upstream {} answered {}", host, status);
            return Err(DownloadError::Upstream);
        }

        debug!("Upstream {} answered {}", host, status);
        Ok(response)
    }
}
