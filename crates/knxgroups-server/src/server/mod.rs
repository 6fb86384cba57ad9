mod api;
mod config;
mod validation;

use crate::cli::Args;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use config::ServerConfig;

pub async fn start_server(args: Args) -> Result<()> {
    let config = ServerConfig::from_args(&args);
    let app = Router::new()
        .route("/api/import", post(api::handle_import))
        .route("/api/health", get(api::health_check))
        .layer(DefaultBodyLimit::max(config.max_upload_size_bytes))
        .with_state(config.clone());

    let app = if config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let addr = SocketAddr::from((config.bind_address.parse::<std::net::IpAddr>()?, config.port));
    log::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
