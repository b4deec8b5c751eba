//! Page-view counter behind the portfolio site.
//!
//! # Endpoint
//!
//! `POST /api/incr` with `Content-Type: application/json` and `{"unit": "blogs", "slug": "my-post"}`.
//!
//! | Response | When |
//! |---|---|
//! | 202, `x-view-counted: true` | view counted |
//! | 202, `x-view-counted: false` | same visitor already counted for this slug within the window |
//! | 400 | not json, unreadable body, `Unit is required`, `Slug not found` |
//! | 405 | anything but POST |
//! | 500 | Redis failure |
//!
//! Bodies are always empty on 202. The site never reads the response, counting is best effort.
//!
//!
//!
//! # Deduplication
//!
//! - Visitor is identified by the peer address, or by `X-Forwarded-For` when `TRUST_PROXY=true`
//! - Address is hashed with SHA-256 before touching Redis
//! - One marker per (visitor, slug), expires after `DEDUP_TTL_SECS` (24 hours by default)
//! - No address, no deduplication: the view is counted
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `1111` |
//! | `REDIS_URL` | `redis://redis:6379` |
//! | `DEDUP_TTL_SECS` | `86400` |
//! | `TRUST_PROXY` | `false` |
//! | `RUST_LOG` | unset |
//!
//!
//!
//! # Commands
//!
//! Read a count back by hand.
//! ```sh
//! redis-cli GET pageviews:blogs:my-post
//! ```
//!
//! Fire a view at a running server.
//! ```sh
//! cargo run -p tester -- blogs my-post --repeat 2
//! ```
use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{any, get},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod counter;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{health_handler, incr_handler};
use state::AppState;

pub const INCR_PATH: &str = "/api/incr";
pub const HEALTH_PATH: &str = "/health";

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(INCR_PATH, any(incr_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;
    let port = config.port;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        wait_for_signal(ctrl_c().await, "Ctrl+C").await;
    };

    #[cfg(unix)]
    let terminate = async {
        let received = match signal(SignalKind::terminate()) {
            Ok(mut stream) => stream
                .recv()
                .await
                .ok_or_else(|| io::Error::other("terminate stream closed")),
            Err(e) => Err(e),
        };

        wait_for_signal(received, "terminate signal").await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// A listener that could not be installed never fires, the other one still can.
async fn wait_for_signal(received: io::Result<()>, name: &str) {
    match received {
        Ok(()) => info!("Received {name}, shutting down"),
        Err(e) => {
            error!("Failed to listen for {name}: {e}");

            std::future::pending::<()>().await
        }
    }
}
