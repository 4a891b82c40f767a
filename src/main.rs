use anyhow::Result;
use axum::{middleware as axum_middleware, response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use rental_marketplace::config::EnvironmentConfig;
use rental_marketplace::database;
use rental_marketplace::middleware::{
    auth::auth_middleware,
    cors::{cors_middleware, cors_middleware_with_origins},
};
use rental_marketplace::routes;
use rental_marketplace::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Rental Marketplace - Booking & Settlement API");
    info!("================================================");

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let config = EnvironmentConfig::default();
    let app_state = AppState::new(pool, config.clone());

    // Rutas autenticadas con JWT; el webhook queda fuera del middleware
    let api_routes = Router::new()
        .nest("/api/booking", routes::booking_routes::create_booking_router())
        .nest("/api/coupon", routes::coupon_routes::create_coupon_router())
        .nest(
            "/api/notification",
            routes::notification_routes::create_notification_router(),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // CORS abierto en desarrollo; con orígenes explícitos en producción
    let cors = if config.cors_origins == ["*"] {
        cors_middleware()
    } else {
        cors_middleware_with_origins(config.cors_origins.clone())
    };

    let app = Router::new()
        .route("/test", get(test_endpoint))
        .merge(api_routes)
        .nest("/webhooks", routes::webhook_routes::create_webhook_router())
        .layer(cors)
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("📅 Endpoints - Booking:");
    info!("   POST /api/booking - Crear solicitud de reserva");
    info!("   GET  /api/booking - Listar reservas del usuario");
    info!("   GET  /api/booking/:id - Obtener reserva");
    info!("   POST /api/booking/:id/approve - Aprobar (owner/admin)");
    info!("   POST /api/booking/:id/reject - Rechazar (owner/admin)");
    info!("   POST /api/booking/:id/start - Entrega del vehículo");
    info!("   POST /api/booking/:id/complete - Completar reserva");
    info!("   POST /api/booking/:id/cancel - Cancelar con reembolso");
    info!("   POST /api/booking/:id/review - Reseña (booking completado)");
    info!("🎟️  Endpoints - Coupon:");
    info!("   POST /api/coupon/validate - Validar código de descuento");
    info!("🔔 Endpoints - Notification:");
    info!("   GET  /api/notification - Listar notificaciones");
    info!("   POST /api/notification/:id/read - Marcar como leída");
    info!("💳 Endpoints - Webhook:");
    info!("   POST /webhooks/stripe - Settlement de pagos");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Rental Marketplace API funcionando correctamente",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
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
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
