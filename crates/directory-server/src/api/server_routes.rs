//! Маршруты для серверов: heartbeat, регистрация, каталог, статус для клиентов.

use crate::api::AppState;
use crate::error::AppError;
use crate::services::directory_service::{self, DirectoryFilter};
use crate::services::heartbeat_service::{self, HeartbeatData};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use directory_entities::servers::Model;
use serde::{Deserialize, Serialize};

// ── Типы запросов/ответов ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
}

impl From<HeartbeatRequest> for HeartbeatData {
    fn from(req: HeartbeatRequest) -> Self {
        HeartbeatData {
            id: req.id,
            name: req.name,
            address: req.address,
            port: req.port,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub id: String,
    pub active: bool,
    pub last_seen: Option<String>,
}

impl From<Model> for HeartbeatResponse {
    fn from(s: Model) -> Self {
        HeartbeatResponse {
            id: s.id,
            active: s.active,
            last_seen: s.last_seen,
        }
    }
}

/// Элемент каталога, который видит игровой клиент.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: i32,
    pub last_seen: Option<String>,
    pub created_at: String,
}

impl From<Model> for ServerInfo {
    fn from(s: Model) -> Self {
        ServerInfo {
            id: s.id,
            name: s.name,
            address: s.address,
            port: s.port,
            last_seen: s.last_seen,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDetails {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: i32,
    pub active: bool,
    pub last_seen: Option<String>,
    pub created_at: String,
}

impl From<Model> for ServerDetails {
    fn from(s: Model) -> Self {
        ServerDetails {
            id: s.id,
            name: s.name,
            address: s.address,
            port: s.port,
            active: s.active,
            last_seen: s.last_seen,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub min_client_version: Option<String>,
    pub maintenance: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/servers/heartbeat", post(do_heartbeat))
        .route("/servers/register", post(register))
        .route("/servers", get(list_servers))
        .route("/servers/{id}", get(get_server))
        .route("/status", get(client_status))
}

// ── Обработчики ──────────────────────────────────────────────────────────────

/// POST /api/v1/servers/heartbeat — heartbeat с неявной регистрацией.
async fn do_heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    let record = heartbeat_service::heartbeat(&state.db, req.into()).await?;
    Ok(Json(record.into()))
}

/// POST /api/v1/servers/register — явная регистрация (address и port обязательны).
async fn register(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    let record = heartbeat_service::register(&state.db, req.into()).await?;
    Ok(Json(record.into()))
}

/// GET /api/v1/servers?filter= — активные серверы в стабильном порядке.
///
/// При недоступной БД возвращается ошибка, а не пустой список.
async fn list_servers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ServerInfo>>, AppError> {
    let filter = DirectoryFilter {
        name_contains: query.filter,
    };
    let servers = directory_service::list_active(&state.db, &filter).await?;
    Ok(Json(servers.into_iter().map(ServerInfo::from).collect()))
}

/// GET /api/v1/servers/{id} — одна запись в любом состоянии.
async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServerDetails>, AppError> {
    match directory_service::get_server(&state.db, &id).await? {
        Some(server) => Ok(Json(server.into())),
        None => Err(AppError::NotFound(format!("Сервер {id} не найден"))),
    }
}

/// GET /api/v1/status — что клиенту нужно знать до построения списка.
async fn client_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let settings = state.settings();
    Ok(Json(StatusResponse {
        min_client_version: settings.min_client_version().await?,
        maintenance: settings.maintenance_mode().await?.unwrap_or(false),
    }))
}
