//! Shared test helpers for lookup E2E tests.

use actix_web::{App, dev::ServiceResponse, test, web};
use base64::{Engine, engine::general_purpose::STANDARD};
use goat_memory_lib::api::{self, PublicOrigin};
use goat_memory_lib::config::FirebaseSettings;
use goat_memory_lib::db::{FirestoreClient, UserDirectory};
use secrecy::SecretString;
use std::sync::Arc;

use super::mock_firestore::{MockFirestore, TEST_PROJECT};

/// API key the directory sends.
pub const TEST_API_KEY: &str = "e2e-api-key";
/// App id sent as `X-Firebase-GMPID`.
pub const TEST_APP_ID: &str = "1:111111111111:web:e2e";
/// Public origin for download links.
pub const TEST_ORIGIN: &str = "https://goat.example.com";

/// Prefix of every download link built against [`TEST_ORIGIN`].
pub fn download_prefix() -> String {
    format!("{}/api/download?u=", TEST_ORIGIN)
}

/// Firebase settings pointing at the mock as an emulator.
pub fn firebase_settings(mock: &MockFirestore) -> FirebaseSettings {
    FirebaseSettings {
        api_key: SecretString::from(TEST_API_KEY.to_string()),
        auth_domain: format!("{}.firebaseapp.com", TEST_PROJECT),
        project_id: TEST_PROJECT.to_string(),
        storage_bucket: format!("{}.appspot.com", TEST_PROJECT),
        messaging_sender_id: "111111111111".to_string(),
        app_id: TEST_APP_ID.to_string(),
        emulator_host: Some(mock.host.clone()),
    }
}

/// Create a test app serving the page and `/api/lookup`.
pub async fn create_test_app(
    mock: &MockFirestore,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let client = FirestoreClient::new(&firebase_settings(mock)).expect("failed to build client");
    let directory: Arc<dyn UserDirectory> = Arc::new(client);

    test::init_service(
        App::new()
            .app_data(web::Data::from(directory))
            .app_data(web::Data::new(PublicOrigin(TEST_ORIGIN.to_string())))
            .service(web::scope("/api").configure(api::configure_lookup_routes))
            .configure(api::configure_page_routes),
    )
    .await
}

/// Source URL carried by a download link.
pub fn decode_download_link(href: &str) -> String {
    let encoded = href
        .strip_prefix(&download_prefix())
        .unwrap_or_else(|| panic!("unexpected link {}", href));
    let b64 = urlencoding::decode(encoded).expect("link is not percent-encoded");
    let bytes = STANDARD.decode(b64.as_bytes()).expect("link is not base64");
    String::from_utf8(bytes).expect("link is not UTF-8")
}

/// Extract the `href` of the page's plain download anchor.
pub fn page_download_href(html: &str) -> Option<String> {
    let start = html.find(&format!("href=\"{}", download_prefix()))? + "href=\"".len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}
