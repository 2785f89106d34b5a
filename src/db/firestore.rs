//! Firestore REST client for the `users` collection.
//!
//! Talks to `firestore.googleapis.com` (or a local emulator) with the web
//! app's API key, the way the Firebase web SDK does for unauthenticated
//! reads. Documents come back as typed values and are decoded into
//! [`UserRecord`] here.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use url::Url;

use super::{USERS_COLLECTION, UserDirectory};
use crate::config::FirebaseSettings;
use crate::error::{AppError, AppResult};
use crate::models::{Project, UserRecord};

/// Production Firestore endpoint.
const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Header the web SDK uses to identify the Firebase app.
const GMPID_HEADER: &str = "X-Firebase-GMPID";

/// HTTP connect timeout for Firestore requests.
const FIRESTORE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout for Firestore requests.
const FIRESTORE_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Firestore document as returned by the REST API.
#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

/// Firestore-backed user directory.
#[derive(Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    documents_url: String,
    api_key: SecretString,
    app_id: String,
}

impl FirestoreClient {
    /// Create the client from Firebase settings.
    ///
    /// The endpoint is the emulator when `emulator_host` is set, otherwise
    /// production Firestore. The HTTP client is built with timeouts first;
    /// if that fails a default client is used instead.
    pub fn new(settings: &FirebaseSettings) -> AppResult<Self> {
        let base = match settings.emulator_host {
            Some(ref host) => {
                warn!("Using Firestore emulator at {}", host);
                format!("http://{}", host.trim_end_matches('/'))
            }
            None => FIRESTORE_ENDPOINT.to_string(),
        };

        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            base, settings.project_id
        );

        let http = build_http_client()?;

        info!(
            "Firestore client initialized (project={}, app_id={}, auth_domain={}, storage_bucket={}, messaging_sender_id={})",
            settings.project_id,
            settings.app_id,
            settings.auth_domain,
            settings.storage_bucket,
            settings.messaging_sender_id
        );

        Ok(Self {
            http,
            documents_url,
            api_key: settings.api_key.clone(),
            app_id: settings.app_id.clone(),
        })
    }

    /// Build a request URL below the documents root, with the API key attached.
    fn url(&self, path: &str) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.documents_url, path))
            .map_err(|e| AppError::Internal(format!("Invalid Firestore URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }
}

/// Build the Firestore HTTP client, falling back to defaults if the tuned one fails.
fn build_http_client() -> AppResult<reqwest::Client> {
    let tuned = reqwest::Client::builder()
        .connect_timeout(FIRESTORE_CONNECT_TIMEOUT)
        .timeout(FIRESTORE_REQUEST_TIMEOUT)
        .user_agent(concat!("goat-memory/", env!("CARGO_PKG_VERSION")))
        .build();

    match tuned {
        Ok(client) => Ok(client),
        Err(e) => {
            warn!(
                "Failed to build tuned Firestore HTTP client ({}), falling back to defaults",
                e
            );
            reqwest::Client::builder().build().map_err(|e| {
                AppError::Internal(format!("Failed to build Firestore HTTP client: {}", e))
            })
        }
    }
}

#[async_trait]
impl UserDirectory for FirestoreClient {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<UserRecord>> {
        // An empty id would address the collection itself
        if id.is_empty() {
            return Ok(None);
        }

        let url = self.url(&format!(
            "/{}/{}",
            USERS_COLLECTION,
            urlencoding::encode(id)
        ))?;

        let response = self
            .http
            .get(url)
            .header(GMPID_HEADER, &self.app_id)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("No document at {}/{}", USERS_COLLECTION, id);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::Lookup(format!(
                "Firestore returned {} for document {}/{}",
                status, USERS_COLLECTION, id
            )));
        }

        let document: Document = serde_json::from_slice(&response.bytes().await?)?;
        Ok(Some(decode_user(document)))
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<UserRecord>> {
        let url = self.url(":runQuery")?;
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": USERS_COLLECTION }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "phone" },
                        "op": "EQUAL",
                        "value": { "stringValue": phone }
                    }
                },
                "limit": 1
            }
        });

        let response = self
            .http
            .post(url)
            .header(GMPID_HEADER, &self.app_id)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Lookup(format!(
                "Firestore returned {} for phone query on {}",
                status, USERS_COLLECTION
            )));
        }

        let items: Vec<RunQueryItem> = serde_json::from_slice(&response.bytes().await?)?;
        Ok(items
            .into_iter()
            .find_map(|item| item.document)
            .map(decode_user))
    }
}

fn decode_user(document: Document) -> UserRecord {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = &document.fields;

    let phone = fields
        .get("phone")
        .and_then(scalar_string)
        .unwrap_or_default();

    let projects: BTreeMap<String, Project> = fields
        .get("projects")
        .and_then(map_fields)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(name, value)| {
                    let project = map_fields(value)?;
                    Some((
                        name.clone(),
                        Project {
                            url: project
                                .get("url")
                                .and_then(scalar_string)
                                .unwrap_or_default(),
                            updated_at: project.get("updatedAt").and_then(timestamp),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    UserRecord {
        id,
        phone,
        projects,
        last_updated: fields.get("lastUpdated").and_then(timestamp),
    }
}

/// Fields of a `mapValue`.
fn map_fields(value: &Value) -> Option<&Map<String, Value>> {
    value.get("mapValue")?.get("fields")?.as_object()
}

/// A `stringValue`, or an `integerValue` (sent as a decimal string).
fn scalar_string(value: &Value) -> Option<String> {
    value
        .get("stringValue")
        .or_else(|| value.get("integerValue"))
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
