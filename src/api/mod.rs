//! API endpoint modules.

pub mod download;
pub mod health;
pub mod lookup;
pub mod openapi;
pub mod page;

use actix_web::{HttpRequest, web};

pub use download::configure_routes as configure_download_routes;
pub use health::configure_health_routes;
pub use lookup::configure_routes as configure_lookup_routes;
pub use openapi::ApiDoc;
pub use page::configure_routes as configure_page_routes;

/// Public origin configured for download links.
#[derive(Debug, Clone)]
pub struct PublicOrigin(pub String);

/// Origin used in download links: the configured public URL, otherwise
/// the scheme and host the request arrived on.
pub fn request_origin(req: &HttpRequest) -> String {
    if let Some(origin) = req.app_data::<web::Data<PublicOrigin>>() {
        return origin.0.trim_end_matches('/').to_string();
    }

    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}
