use axum::{middleware::from_fn, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use salon_api::database::manager::DatabaseManager;
use salon_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = salon_api::config::config();
    tracing::info!("Starting salon API in {:?} mode", config.environment);

    let app = app();

    let port = std::env::var("SALON_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router {
    use axum::routing::{post, put};
    use salon_api::handlers::{catalog, clients, commissions, dashboard, franchises, sites};

    Router::new()
        // Franchise topology (super_admin only)
        .route(
            "/api/franquicias",
            get(franchises::list_franchises).post(franchises::create_franchise),
        )
        .route(
            "/api/franquicias/:franquicia_id",
            get(franchises::get_franchise)
                .put(franchises::rename_franchise)
                .delete(franchises::delete_franchise),
        )
        .route(
            "/api/franquicias/:franquicia_id/sedes/:sede_id",
            post(franchises::assign_site).delete(franchises::unassign_site),
        )
        // Sites
        .route("/api/sedes", get(sites::list_sites).post(sites::create_site))
        .route("/api/sedes/:sede_id", get(sites::get_site))
        .route("/api/sedes/:sede_id/cuentas", get(sites::list_site_accounts))
        // Clients
        .route(
            "/api/clientes",
            get(clients::list_clients).post(clients::create_client),
        )
        .route("/api/clientes/paginado", get(clients::list_clients_paginated))
        .route(
            "/api/clientes/:cliente_id",
            get(clients::get_client).put(clients::update_client),
        )
        .route("/api/clientes/:cliente_id/notas", post(clients::add_client_note))
        // Service catalog
        .route(
            "/api/servicios",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/api/servicios/:servicio_id",
            get(catalog::get_service)
                .put(catalog::update_service)
                .delete(catalog::delete_service),
        )
        .route(
            "/api/servicios/:servicio_id/validar",
            get(catalog::validate_service),
        )
        // Commissions
        .route("/api/comisiones", get(commissions::list_commissions))
        .route(
            "/api/comisiones/:comision_id",
            get(commissions::get_commission),
        )
        .route(
            "/api/comisiones/:comision_id/liquidar",
            put(commissions::settle_commission),
        )
        // Sales dashboard
        .route("/api/dashboard/ventas", get(dashboard::sales_dashboard))
        .route_layer(from_fn(jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "salon-api",
        "status": "ok"
    }))
}

async fn health() -> Json<Value> {
    let database = match DatabaseManager::health_check().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Json(json!({
        "status": "ok",
        "database": database
    }))
}
