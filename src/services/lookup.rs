//! Phone lookup flow behind the page and the JSON lookup endpoint.
//!
//! ```text
//! Idle --submit--> Loading --resolve--> Settled(outcome)
//!   |                  |
//!   |                  +----error----> Failed
//!   +--empty phone--> Settled(InvalidPhone)
//! ```
//!
//! A new submission always starts again from `submit`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, error};

use crate::db::{UserDirectory, find_user_by_phone};
use crate::error::AppResult;
use crate::models::{UserRecord, normalize_phone};

/// Path of the proxy route, relative to the public origin.
pub const DOWNLOAD_PATH: &str = "/api/download";

/// Link to the proxy route for one source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// Source video URL
    pub target: String,
    /// `<origin>/api/download?u=<percent-encoded base64>`
    pub href: String,
}

impl DownloadLink {
    pub fn new(origin: &str, target: &str) -> Self {
        let encoded = STANDARD.encode(target.as_bytes());
        let href = format!(
            "{}{}?u={}",
            origin.trim_end_matches('/'),
            DOWNLOAD_PATH,
            urlencoding::encode(&encoded)
        );
        Self {
            target: target.to_string(),
            href,
        }
    }
}

/// Terminal result of a lookup that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Nothing left after stripping non-digits; no lookup was made
    InvalidPhone,
    NotFound,
    /// User exists but has not completed every required project
    Incomplete,
    Ready(DownloadLink),
}

impl LookupOutcome {
    /// Message shown to the user, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPhone => Some("Ingresa un celular válido."),
            Self::NotFound => Some("No encontramos un usuario con ese celular."),
            Self::Incomplete => {
                Some("Para realizar tu GOAT Memory, realiza todas las experiencias.")
            }
            Self::Ready(_) => None,
        }
    }

    fn for_user(user: Option<UserRecord>, origin: &str) -> Self {
        let Some(user) = user else {
            return Self::NotFound;
        };
        match user.completed_body_url() {
            Some(body_url) => Self::Ready(DownloadLink::new(origin, body_url)),
            None => Self::Incomplete,
        }
    }
}

/// Page state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Loading { phone: String },
    Settled(LookupOutcome),
    Failed,
}

impl LookupState {
    pub const FAILURE_NOTICE: &'static str = "Ocurrió un error consultando la información.";

    /// Start a submission.
    pub fn submit(raw_phone: &str) -> Self {
        let phone = normalize_phone(raw_phone);
        if phone.is_empty() {
            return Self::Settled(LookupOutcome::InvalidPhone);
        }
        Self::Loading { phone }
    }

    /// Finish a `Loading` state with the directory result. Other states are returned unchanged.
    pub fn resolve(self, result: AppResult<Option<UserRecord>>, origin: &str) -> Self {
        let phone = match self {
            Self::Loading { phone } => phone,
            other => return other,
        };

        match result {
            Ok(user) => {
                let outcome = LookupOutcome::for_user(user, origin);
                debug!(
                    "Lookup for {} digits settled: {}",
                    phone.len(),
                    outcome.notice().unwrap_or("ready")
                );
                Self::Settled(outcome)
            }
            Err(e) => {
                error!("User lookup failed: {}", e);
                Self::Failed
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Settled(outcome) => outcome.notice(),
            Self::Failed => Some(Self::FAILURE_NOTICE),
            Self::Idle | Self::Loading { .. } => None,
        }
    }

    pub fn link(&self) -> Option<&DownloadLink> {
        match self {
            Self::Settled(LookupOutcome::Ready(link)) => Some(link),
            _ => None,
        }
    }
}

/// Run a whole submission against the directory.
pub async fn run_lookup(
    directory: &dyn UserDirectory,
    raw_phone: &str,
    origin: &str,
) -> LookupState {
    let state = LookupState::submit(raw_phone);
    let LookupState::Loading { ref phone } = state else {
        return state;
    };

    let result = find_user_by_phone(directory, phone).await;
    state.resolve(result, origin)
}
