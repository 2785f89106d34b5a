//! E2E tests: JSON lookup endpoint.

use actix_web::test;
use serde_json::Value;

use super::mock_firestore::MockFirestore;
use super::test_helpers::*;

const BODY_URL: &str = "https://cdn.example.com/clips/body.mp4?token=a+b";
const HEART_URL: &str = "https://cdn.example.com/clips/heart.mp4";

async fn lookup<S>(app: &S, phone: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/lookup?phone={}", urlencoding::encode(phone)))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Document keyed by phone → ready, found without a field query.
#[actix_rt::test]
async fn test_ready_by_document_id() {
    let mock = MockFirestore::start().await;
    mock.insert_user("3001234567", "3001234567", Some(BODY_URL), Some(HEART_URL));
    let app = create_test_app(&mock).await;

    let (status, body) = lookup(&app, "3001234567").await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "ready");
    let href = body["download_url"].as_str().unwrap();
    assert_eq!(decode_download_link(href), BODY_URL);
    assert_eq!(mock.hits(), (1, 0));

    let state = mock.state.lock().unwrap();
    assert_eq!(state.last_api_key.as_deref(), Some(TEST_API_KEY));
    assert_eq!(state.last_gmpid.as_deref(), Some(TEST_APP_ID));
}

/// Document under another id → found by the phone field query.
#[actix_rt::test]
async fn test_ready_by_phone_field() {
    let mock = MockFirestore::start().await;
    mock.insert_user("auto-id-1", "3001234567", Some(BODY_URL), Some(HEART_URL));
    let app = create_test_app(&mock).await;

    let (status, body) = lookup(&app, "300 123 4567").await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "ready");
    assert_eq!(mock.hits(), (1, 1));
}

/// No document → not_found after both lookups.
#[actix_rt::test]
async fn test_not_found() {
    let mock = MockFirestore::start().await;
    mock.insert_user("3009999999", "3009999999", Some(BODY_URL), Some(HEART_URL));
    let app = create_test_app(&mock).await;

    let (status, body) = lookup(&app, "3001234567").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "not_found");
    assert!(body.get("download_url").is_none());
    assert_eq!(mock.hits(), (1, 1));
}

/// Missing or blank heart url → incomplete.
#[actix_rt::test]
async fn test_incomplete() {
    let mock = MockFirestore::start().await;
    mock.insert_user("3001234567", "3001234567", Some(BODY_URL), None);
    mock.insert_user("3007654321", "3007654321", Some(BODY_URL), Some("   "));
    let app = create_test_app(&mock).await;

    for phone in ["3001234567", "3007654321"] {
        let (status, body) = lookup(&app, phone).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "incomplete", "{phone}");
        assert!(body.get("download_url").is_none());
    }
}

/// Surrounding whitespace in the body url is trimmed before encoding.
#[actix_rt::test]
async fn test_body_url_is_trimmed() {
    let mock = MockFirestore::start().await;
    let padded = format!("  {}\n", BODY_URL);
    mock.insert_user("3001234567", "3001234567", Some(&padded), Some(HEART_URL));
    let app = create_test_app(&mock).await;

    let (_, body) = lookup(&app, "3001234567").await;
    assert_eq!(
        decode_download_link(body["download_url"].as_str().unwrap()),
        BODY_URL
    );
}

/// No digits → invalid_phone without touching the directory.
#[actix_rt::test]
async fn test_invalid_phone() {
    let mock = MockFirestore::start().await;
    let app = create_test_app(&mock).await;

    for phone in ["", "abc", " - "] {
        let (status, body) = lookup(&app, phone).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "invalid_phone", "{phone:?}");
    }
    assert_eq!(mock.hits(), (0, 0));
}

/// Directory failure → 500 with a generic message.
#[actix_rt::test]
async fn test_directory_failure() {
    let mock = MockFirestore::start().await;
    mock.set_failing(true);
    let app = create_test_app(&mock).await;

    let (status, body) = lookup(&app, "3001234567").await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "LOOKUP_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("Firestore"));
}
