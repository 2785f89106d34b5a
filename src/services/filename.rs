//! Download filename resolution.
//!
//! The path-derived name is the default; a filename directive in the
//! upstream `Content-Disposition` header overrides it verbatim.

use chrono::Utc;
use url::Url;

/// Extension forced onto path-derived names.
const VIDEO_EXTENSION: &str = ".mp4";

const DIRECTIVE: &[u8] = b"filename";
const UTF8_PREFIX: &[u8] = b"utf-8''";

/// Filename directive found in a `Content-Disposition` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionFilename {
    Present(String),
    Absent,
}

impl DispositionFilename {
    /// Scan a header value for `filename=` / `filename*=`.
    ///
    /// Matching is permissive: the directive name is case-insensitive and
    /// may appear anywhere, the value may be quoted or carry a `UTF-8''`
    /// tag, and it runs until the next `"` or `;`. Percent escapes in an
    /// extended value are kept as they are.
    pub fn parse(header: &str) -> Self {
        let bytes = header.as_bytes();
        (0..bytes.len())
            .find_map(|pos| directive_value_at(header, pos))
            .map(|value| Self::Present(value.to_string()))
            .unwrap_or(Self::Absent)
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Present(name) => Some(name),
            Self::Absent => None,
        }
    }
}

fn directive_value_at(header: &str, pos: usize) -> Option<&str> {
    let bytes = header.as_bytes();
    let mut i = pos;

    if !starts_with_ignore_case(&bytes[i..], DIRECTIVE) {
        return None;
    }
    i += DIRECTIVE.len();
    if bytes.get(i) == Some(&b'*') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i += 1;

    let rest = &header[i..];
    let prefix_len = if starts_with_ignore_case(rest.as_bytes(), UTF8_PREFIX) {
        UTF8_PREFIX.len()
    } else if rest.starts_with('"') {
        1
    } else {
        0
    };

    // Prefer consuming the prefix; fall back to reading it as part of the value.
    if prefix_len > 0
        && let Some(value) = value_token(&rest[prefix_len..])
    {
        return Some(value);
    }
    value_token(rest)
}

fn value_token(s: &str) -> Option<&str> {
    let end = s.find(['"', ';']).unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// Filename taken from the target path, `download-<unix millis>` when the
/// path ends in `/`, always ending in `.mp4`.
pub fn default_filename(target: &Url, now_millis: i64) -> String {
    let segment = target.path().rsplit('/').next().unwrap_or_default();

    let mut name = if segment.is_empty() {
        format!("download-{}", now_millis)
    } else {
        segment.to_string()
    };

    if !name.ends_with(VIDEO_EXTENSION) {
        name.push_str(VIDEO_EXTENSION);
    }
    name
}

/// Resolve the attachment filename for a proxied download.
pub fn resolve_filename(target: &Url, content_disposition: Option<&str>) -> String {
    content_disposition
        .map(DispositionFilename::parse)
        .and_then(DispositionFilename::into_option)
        .unwrap_or_else(|| default_filename(target, Utc::now().timestamp_millis()))
}

/// Outgoing `Content-Disposition` value.
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}
