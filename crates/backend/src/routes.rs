use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::shared::config::ServerConfig;
use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes(server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    api_routes()
        .fallback_service(static_files(&server.static_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_mb * 1024 * 1024))
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors)
}

fn api_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Supply contracts
        .route(
            "/api/contracts",
            get(handlers::a001_supply_contract::list_all),
        )
        .route(
            "/api/contracts/export",
            get(handlers::a001_supply_contract::export_csv),
        )
        // A002 Measurements
        .route(
            "/api/measurements",
            get(handlers::a002_measurement::list_all),
        )
        // A003 Attachments
        .route(
            "/api/contracts/:contract_number/attachments",
            get(handlers::a003_attachment::list_by_contract)
                .post(handlers::a003_attachment::upload),
        )
        .route(
            "/api/attachments/:id/download",
            get(handlers::a003_attachment::download),
        )
        .route(
            "/api/attachments/:id",
            axum::routing::delete(handlers::a003_attachment::delete),
        )
}

/// Статика фронтенда; неизвестные пути отдают `index.html` (SPA).
fn static_files(static_dir: &str) -> ServeDir<ServeFile> {
    let index = Path::new(static_dir).join("index.html");
    ServeDir::new(static_dir).fallback(ServeFile::new(index))
}
