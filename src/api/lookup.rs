//! JSON phone lookup endpoint.

use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::request_origin;
use crate::db::UserDirectory;
use crate::error::{AppError, AppResult};
use crate::services::{LookupOutcome, LookupState, run_lookup};

/// Query parameters for a lookup.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LookupQuery {
    /// Phone number as typed; non-digits are ignored
    #[serde(default)]
    pub phone: String,
}

/// Lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// Both experiences completed; `download_url` is set
    Ready,
    /// User found without every experience completed
    Incomplete,
    NotFound,
    /// No digits in the submitted phone
    InvalidPhone,
}

/// Lookup response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LookupResponse {
    pub status: LookupStatus,
    /// Proxy download link for the GOAT Body video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<LookupOutcome> for LookupResponse {
    fn from(outcome: LookupOutcome) -> Self {
        let (status, download_url) = match outcome {
            LookupOutcome::Ready(link) => (LookupStatus::Ready, Some(link.href)),
            LookupOutcome::Incomplete => (LookupStatus::Incomplete, None),
            LookupOutcome::NotFound => (LookupStatus::NotFound, None),
            LookupOutcome::InvalidPhone => (LookupStatus::InvalidPhone, None),
        };
        Self {
            status,
            download_url,
        }
    }
}

/// Look a user up by phone.
#[utoipa::path(
    get,
    path = "/api/lookup",
    tag = "Lookup",
    params(LookupQuery),
    responses(
        (status = 200, description = "Lookup settled", body = LookupResponse),
        (status = 500, description = "User directory unavailable", body = crate::error::ErrorResponse)
    )
)]
#[get("/lookup")]
pub async fn lookup(
    req: HttpRequest,
    directory: web::Data<dyn UserDirectory>,
    query: web::Query<LookupQuery>,
) -> AppResult<HttpResponse> {
    let origin = request_origin(&req);

    match run_lookup(directory.get_ref(), &query.phone, &origin).await {
        LookupState::Settled(outcome) => Ok(HttpResponse::Ok().json(LookupResponse::from(outcome))),
        LookupState::Failed => Err(AppError::Lookup("user directory lookup failed".to_string())),
        state => Err(AppError::Internal(format!(
            "lookup did not settle: {:?}",
            state
        ))),
    }
}

/// Configure lookup routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(lookup);
}
