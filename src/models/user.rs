//! User records read from the `users` collection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Project holding the downloadable body video.
pub const GOAT_BODY: &str = "goatBody";

/// Project that must also be completed before the download is offered.
pub const GOAT_HEART: &str = "goatHeart";

/// A completed experience on a user document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Project {
    pub url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// User document. Provisioned elsewhere; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub phone: String,
    pub projects: BTreeMap<String, Project>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Trimmed URL of a project, if the project exists and its URL is non-empty.
    pub fn project_url(&self, name: &str) -> Option<&str> {
        self.projects
            .get(name)
            .map(|p| p.url.trim())
            .filter(|url| !url.is_empty())
    }

    /// The body video URL, offered only once both required projects are done.
    pub fn completed_body_url(&self) -> Option<&str> {
        let body = self.project_url(GOAT_BODY)?;
        self.project_url(GOAT_HEART)?;
        Some(body)
    }
}

/// Strip every non-digit character from a phone number.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
