mod config;
mod controllers;
mod database;
mod dto;
mod models;
mod repositories;
mod routes;
mod services;
mod socket;
mod state;
mod utils;

use anyhow::Result;
use axum::{routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env();

    // Configurar logging (más verboso en desarrollo)
    let log_level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("🧭 Scavenger Hunt Server");
    info!("========================");
    info!("🔧 Entorno: {}", config.environment);

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let app_state = AppState::new(pool, config.clone());

    let app = Router::new()
        .route("/test", get(test_endpoint))
        // Socket de equipos
        .route("/ws/app", get(socket::ws_handler))
        // API de staff
        .nest("/api/route", routes::route_routes::create_route_router())
        .nest(
            "/api/team-destination",
            routes::team_destination_routes::create_team_destination_router(),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("   GET  /ws/app - Socket de equipos (WebSocket)");
    info!("🗺  Endpoints de staff - Route:");
    info!("   POST /api/route/:id/distribute - Distribuir ruta a equipos");
    info!("   POST /api/route/:id/clear-distribution - Limpiar distribución");
    info!("   POST /api/route/:id/reorder - Reordenar pasos");
    info!("   PUT  /api/route/:id/part/:part_id - Actualizar paso");
    info!("   GET  /api/route/:id/map-state - Estado en vivo del mapa");
    info!("   GET  /api/route/:id/stats - Estadísticas de la ruta");
    info!("📍 Endpoints de staff - Team destinations:");
    info!("   POST /api/team-destination/bulk-move");
    info!("   POST /api/team-destination/bulk-update");
    info!("   POST /api/team-destination/bulk-delete");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Endpoint de prueba de vida
async fn test_endpoint() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "status": "ok",
        "service": "hunt-server",
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("👋 Apagando servidor");
}
