//! HTTP API: маршрутизация и состояние приложения.

pub mod admin_routes;
pub mod auth_routes;
pub mod meta_routes;
pub mod middleware;
pub mod server_routes;

use crate::services::meta_service::MetaSettings;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Общее состояние приложения.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password_hash: String,
}

impl AppState {
    pub fn settings(&self) -> MetaSettings {
        MetaSettings::new(self.db.clone())
    }
}

/// Построить маршрутизатор Axum.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .merge(server_routes::routes())
        .merge(meta_routes::routes());

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes::routes())
        .nest("/api/v1", public_routes)
        .nest("/api/v1/admin", admin_routes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — проверка работоспособности сервера.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = state.db.execute_unprepared("SELECT 1").await.is_ok();
    let maintenance = if db_ok {
        state.settings().maintenance_mode().await.ok().flatten()
    } else {
        None
    };
    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "error" },
        "database": db_ok,
        "maintenance": maintenance,
        "service": "directory-server"
    }))
}
