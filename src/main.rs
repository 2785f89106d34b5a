//! GOAT Memory server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use goat_memory_lib::api::{self, ApiDoc, PublicOrigin};
use goat_memory_lib::config::Config;
use goat_memory_lib::db::{FirestoreClient, UserDirectory};
use goat_memory_lib::middleware;
use goat_memory_lib::services::Downloader;

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, all six FIREBASE_* variables must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  GOAT Memory Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        match &config.firebase.emulator_host {
            Some(host) => info!("Using Firestore emulator at {}", host),
            None => info!("Using development Firebase defaults"),
        }
    }

    // Database client first, then the download client
    let directory: Arc<dyn UserDirectory> = match FirestoreClient::new(&config.firebase) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to initialize Firestore client: {}", e);
            std::process::exit(1);
        }
    };
    info!("User directory ready (project {})", config.firebase.project_id);

    let downloader = match Downloader::new(&config.download) {
        Ok(downloader) => downloader,
        Err(e) => {
            error!("Failed to initialize download client: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Download client ready (connect timeout {}s)",
        config.download.connect_timeout.as_secs()
    );

    // Prepare shared state
    let bind_address = config.bind_address();
    let environment = config.environment;
    let public_origin = config.public_url.clone().map(PublicOrigin);
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    match &public_origin {
        Some(origin) => info!("Download links use origin {}", origin.0),
        None => info!("Download links use the request origin"),
    }

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let directory = web::Data::from(directory);
    let downloader = web::Data::new(downloader);
    let environment = web::Data::new(environment);

    // Start HTTP server
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(directory.clone())
            .app_data(downloader.clone())
            .app_data(environment.clone());

        if let Some(ref origin) = public_origin {
            app = app.app_data(web::Data::new(origin.clone()));
        }

        // Swagger UI before the /api scope so the scope does not shadow it
        app = app
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/api")
                    .configure(api::configure_download_routes)
                    .configure(api::configure_lookup_routes)
                    .configure(api::configure_health_routes),
            );

        if let Some(ref dir) = static_dir {
            app = app.service(Files::new("/assets", dir.clone()).prefer_utf8(true));
        }

        app.configure(api::configure_page_routes)
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
