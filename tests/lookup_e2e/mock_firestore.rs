//! Mock Firestore REST API for E2E tests.
//!
//! Answers document gets and `runQuery` calls for the `users` collection
//! from an in-memory map of typed documents.

use actix_web::http::Method;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

/// Project id the mock expects in request paths.
pub const TEST_PROJECT: &str = "goat-e2e";

/// Shared state for the mock Firestore.
#[derive(Default)]
pub struct MockFirestoreState {
    /// Document fields by document id
    pub users: HashMap<String, Value>,
    /// Answer every request with a 500
    pub fail: bool,
    pub get_hits: usize,
    pub query_hits: usize,
    pub last_api_key: Option<String>,
    pub last_gmpid: Option<String>,
}

fn documents_prefix() -> String {
    format!("/v1/projects/{}/databases/(default)/documents", TEST_PROJECT)
}

fn document_json(id: &str, fields: &Value) -> Value {
    json!({
        "name": format!("projects/{}/databases/(default)/documents/users/{}", TEST_PROJECT, id),
        "fields": fields,
        "createTime": "2025-03-01T11:00:00Z",
        "updateTime": "2025-03-01T12:00:00Z"
    })
}

async fn handle(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<Mutex<MockFirestoreState>>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();

    state.last_api_key = url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(k, _)| k == "key")
        .map(|(_, v)| v.into_owned());
    state.last_gmpid = req
        .headers()
        .get("x-firebase-gmpid")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let prefix = documents_prefix();
    let Some(rest) = req.path().strip_prefix(prefix.as_str()) else {
        return HttpResponse::NotFound().finish();
    };

    if rest == ":runQuery" && *req.method() == Method::POST {
        state.query_hits += 1;
        if state.fail {
            return HttpResponse::InternalServerError().json(json!({ "error": { "code": 500 } }));
        }

        let query: Value = serde_json::from_slice(&body).unwrap_or_default();
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "phone");
        assert_eq!(query["structuredQuery"]["limit"], 1);
        let wanted = filter["value"]["stringValue"].as_str().unwrap_or_default();

        let hit = state
            .users
            .iter()
            .find(|(_, fields)| fields["phone"]["stringValue"] == wanted);
        return match hit {
            Some((id, fields)) => HttpResponse::Ok().json(json!([
                { "document": document_json(id, fields), "readTime": "2025-03-01T12:00:00Z" }
            ])),
            None => HttpResponse::Ok().json(json!([{ "readTime": "2025-03-01T12:00:00Z" }])),
        };
    }

    if let Some(id) = rest.strip_prefix("/users/")
        && *req.method() == Method::GET
    {
        state.get_hits += 1;
        if state.fail {
            return HttpResponse::InternalServerError().json(json!({ "error": { "code": 500 } }));
        }
        return match state.users.get(id) {
            Some(fields) => HttpResponse::Ok().json(document_json(id, fields)),
            None => HttpResponse::NotFound().json(json!({ "error": { "code": 404 } })),
        };
    }

    HttpResponse::NotFound().finish()
}

/// Mock Firestore server.
pub struct MockFirestore {
    /// `host:port`, usable as an emulator host
    pub host: String,
    pub state: Arc<Mutex<MockFirestoreState>>,
}

impl MockFirestore {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockFirestoreState::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let host = listener.local_addr().unwrap().to_string();

        let data = web::Data::from(state.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Fire and forget; the server lives until the test runtime shuts down
        tokio::spawn(server);

        MockFirestore { host, state }
    }

    /// Store a user document under `id`.
    pub fn insert_user(&self, id: &str, phone: &str, body_url: Option<&str>, heart_url: Option<&str>) {
        let mut projects = serde_json::Map::new();
        for (name, url) in [("goatBody", body_url), ("goatHeart", heart_url)] {
            if let Some(url) = url {
                projects.insert(
                    name.to_string(),
                    json!({ "mapValue": { "fields": {
                        "url": { "stringValue": url },
                        "updatedAt": { "timestampValue": "2025-03-01T11:59:00Z" }
                    }}}),
                );
            }
        }

        let fields = json!({
            "phone": { "stringValue": phone },
            "lastUpdated": { "timestampValue": "2025-03-01T12:00:00Z" },
            "projects": { "mapValue": { "fields": projects } }
        });
        self.state.lock().unwrap().users.insert(id.to_string(), fields);
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// (document gets, phone queries) seen so far.
    pub fn hits(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.get_hits, state.query_hits)
    }
}
