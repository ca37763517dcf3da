//! Административные маршруты: полный список, статистика, дерегистрация.

use crate::api::middleware::AdminUser;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::admin_service;
use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: i32,
    pub active: bool,
    pub last_seen: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub never_seen: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/servers", get(list_servers))
        .route("/servers/{id}", delete(deregister))
        .route("/stats", get(get_stats))
}

/// GET /api/v1/admin/servers — все серверы, включая неактивные.
async fn list_servers(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<Vec<ServerRow>>, AppError> {
    let servers = admin_service::list_all_servers(&state.db).await?;

    let rows = servers
        .into_iter()
        .map(|s| ServerRow {
            id: s.id,
            name: s.name,
            address: s.address,
            port: s.port,
            active: s.active,
            last_seen: s.last_seen,
            created_at: s.created_at,
        })
        .collect();

    Ok(Json(rows))
}

/// GET /api/v1/admin/stats — статистика реестра.
async fn get_stats(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = admin_service::get_stats(&state.db).await?;

    Ok(Json(StatsResponse {
        total: stats.total,
        active: stats.active,
        inactive: stats.inactive,
        never_seen: stats.never_seen,
    }))
}

/// DELETE /api/v1/admin/servers/{id} — удалить запись насовсем.
async fn deregister(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !admin_service::delete_server(&state.db, &id).await? {
        return Err(AppError::NotFound(format!("Сервер {id} не найден")));
    }
    tracing::info!("Сервер {id} удалён администратором {}", claims.username);

    Ok(Json(serde_json::json!({ "ok": true })))
}
