//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GOAT Memory Server",
        version = "0.1.0",
        description = "Phone lookup for GOAT Memory videos and a streaming download proxy"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Download proxy
        api::download::download,
        // Lookup
        api::lookup::lookup,
        // Health endpoints
        api::health::health,
        api::health::info,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Lookup
            api::lookup::LookupStatus,
            api::lookup::LookupResponse,
            // Health
            api::health::HealthResponse,
            api::health::ServerInfoResponse,
        )
    ),
    tags(
        (name = "Download", description = "Streaming download proxy"),
        (name = "Lookup", description = "Phone lookup"),
        (name = "Health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
