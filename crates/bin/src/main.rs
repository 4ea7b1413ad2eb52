//! circle-io - static host for the browser client.
//!
//! Serves the embedded `client/web` bundle and the runtime client config.
//! The game server itself is a separate process.

mod config;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::HostConfig;

// Embedded static assets from client/web
#[derive(RustEmbed)]
#[folder = "../client/web"]
struct Assets;

const INDEX: &str = "index.html";

#[derive(Clone)]
struct AppState {
    /// Pre-rendered `/config.json` body.
    client_config: Arc<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("circle-io host v{}", env!("CARGO_PKG_VERSION"));

    let config = HostConfig::load()?;
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.http.port);
    info!("Loaded configuration");
    info!("  Game server: {}", config.client.server_url);
    info!("  Client log level: {}", config.client.log_level);

    if Assets::get("pkg/client.js").is_none() {
        warn!("pkg/client.js is not embedded; build the client with wasm-pack first");
    }

    let state = AppState {
        client_config: Arc::new(serde_json::to_string(&config.client.to_json())?),
    };
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.http.bind, port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Serving client on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/index.html", get(serve_index))
        .route("/config.json", get(serve_config))
        .fallback(static_handler)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn serve_index() -> Response {
    serve_asset(INDEX)
}

async fn serve_config(State(state): State<AppState>) -> Response {
    respond(
        StatusCode::OK,
        "application/json",
        Body::from(state.client_config.as_str().to_owned()),
    )
}

/// Embedded file for the request path; anything unknown gets `index.html`.
async fn static_handler(uri: Uri) -> Response {
    let path = asset_path(uri.path());
    if Assets::get(path).is_some() {
        serve_asset(path)
    } else {
        debug!("No asset for {}, falling back to {}", uri.path(), INDEX);
        serve_asset(INDEX)
    }
}

/// Map a request path onto an embedded asset name.
fn asset_path(request: &str) -> &str {
    let path = request.trim_start_matches('/');
    if path.is_empty() { INDEX } else { path }
}

fn serve_asset(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            respond(StatusCode::OK, mime.as_ref(), Body::from(content.data.into_owned()))
        }
        None => {
            warn!("Static file not found: {}", path);
            respond(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", Body::from("404 Not Found"))
        }
    }
}

fn respond(status: StatusCode, content_type: &str, body: Body) -> Response {
    (status, [(header::CONTENT_TYPE, content_type.to_owned())], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path() {
        assert_eq!(asset_path("/"), "index.html");
        assert_eq!(asset_path(""), "index.html");
        assert_eq!(asset_path("/pkg/client.js"), "pkg/client.js");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_index() {
        let response = static_handler(Uri::from_static("/lobby/42")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html"
        );
    }

    #[tokio::test]
    async fn test_config_endpoint_is_json() {
        let state = AppState {
            client_config: Arc::new("{}".to_string()),
        };
        let response = serve_config(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
