//! Mock upstream origin for E2E tests.
//!
//! Serves a handful of fixed files with the header shapes the proxy has to
//! relay: typed, untyped, named, chunked, empty and failing.

use actix_web::web::Bytes;
use actix_web::{App, HttpResponse, HttpServer, get, web};
use futures_util::stream;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Host name the proxy client pins to the mock.
pub const ORIGIN_HOST: &str = "cdn.example.test";

/// Body served by the typed clip route.
pub const CLIP_BODY: &[u8] = b"\x00\x00\x00\x18ftypmp42 fake video payload";

#[get("/clips/abc.mp4")]
async fn clip(hits: web::Data<AtomicUsize>) -> HttpResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok()
        .content_type("video/mp4")
        .body(Bytes::from_static(CLIP_BODY))
}

#[get("/raw/untyped")]
async fn untyped() -> HttpResponse {
    HttpResponse::Ok().body(Bytes::from_static(b"untyped bytes"))
}

#[get("/named")]
async fn named() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("video/quicktime")
        .insert_header(("Content-Disposition", "attachment; filename=\"custom.mov\""))
        .body("named clip")
}

#[get("/extended")]
async fn extended() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((
            "Content-Disposition",
            "attachment; filename*=UTF-8''clip%20one.mp4",
        ))
        .body("extended clip")
}

#[get("/chunked")]
async fn chunked() -> HttpResponse {
    let chunks = (0..4).map(|i| Ok::<_, actix_web::Error>(Bytes::from(format!("part-{};", i))));
    HttpResponse::Ok()
        .content_type("video/mp4")
        .streaming(stream::iter(chunks))
}

#[get("/dir/")]
async fn directory() -> HttpResponse {
    HttpResponse::Ok().body("directory index")
}

#[get("/missing.mp4")]
async fn missing() -> HttpResponse {
    HttpResponse::NotFound().body("nope")
}

#[get("/empty")]
async fn empty() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[get("/broken")]
async fn broken() -> HttpResponse {
    HttpResponse::InternalServerError().body("upstream exploded")
}

/// Mock origin server.
pub struct MockOrigin {
    pub addr: SocketAddr,
    pub clip_hits: Arc<AtomicUsize>,
}

impl MockOrigin {
    /// Start the mock origin on an ephemeral port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let addr = listener.local_addr().unwrap();
        let clip_hits = Arc::new(AtomicUsize::new(0));

        let hits = web::Data::from(clip_hits.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(hits.clone())
                .service(clip)
                .service(untyped)
                .service(named)
                .service(extended)
                .service(chunked)
                .service(directory)
                .service(missing)
                .service(empty)
                .service(broken)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Fire and forget; the server lives until the test runtime shuts down
        tokio::spawn(server);

        MockOrigin { addr, clip_hits }
    }

    /// Absolute URL of `path` on the mock, under the pinned host name.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", ORIGIN_HOST, self.addr.port(), path)
    }

    pub fn clip_hits(&self) -> usize {
        self.clip_hits.load(Ordering::SeqCst)
    }
}
