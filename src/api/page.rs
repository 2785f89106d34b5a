//! Server-rendered lookup page.

use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use askama::Template;
use serde::Deserialize;
use tracing::debug;

use crate::api::request_origin;
use crate::db::UserDirectory;
use crate::error::{AppError, AppResult};
use crate::services::{LookupState, qr, run_lookup};

/// Lookup form submission.
#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub phone: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    phone: &'a str,
    notice: Option<&'static str>,
    download_url: Option<&'a str>,
    qr_svg: Option<String>,
}

impl<'a> IndexPage<'a> {
    fn new(phone: &'a str, state: &'a LookupState) -> Self {
        let download_url = state.link().map(|link| link.href.as_str());
        Self {
            phone,
            notice: state.notice(),
            download_url,
            qr_svg: download_url.and_then(qr::render_svg),
        }
    }
}

fn render(page: IndexPage<'_>) -> AppResult<HttpResponse> {
    let html = page
        .render()
        .map_err(|e| AppError::Internal(format!("Failed to render page: {}", e)))?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(html))
}

/// Empty lookup form.
#[get("/")]
pub async fn index() -> AppResult<HttpResponse> {
    render(IndexPage::new("", &LookupState::Idle))
}

/// Run a lookup and render the result under the form.
#[post("/")]
pub async fn submit(
    req: HttpRequest,
    directory: web::Data<dyn UserDirectory>,
    form: web::Form<LookupForm>,
) -> AppResult<HttpResponse> {
    let origin = request_origin(&req);
    let state = run_lookup(directory.get_ref(), &form.phone, &origin).await;
    debug!("Lookup page settled with link: {}", state.link().is_some());

    render(IndexPage::new(&form.phone, &state))
}

/// Configure page routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(submit);
}
