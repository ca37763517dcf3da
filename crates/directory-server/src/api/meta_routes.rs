//! Маршруты глобальных настроек (таблица meta).

use crate::api::middleware::AdminUser;
use crate::api::AppState;
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaValue {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SetMetaResponse {
    pub previous: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/meta/{key}", get(get_meta).put(put_meta))
}

/// GET /api/v1/meta/{key}
async fn get_meta(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MetaValue>, AppError> {
    match state.settings().get(&key).await? {
        Some(value) => Ok(Json(MetaValue { value })),
        None => Err(AppError::NotFound(format!("Ключ {key} не задан"))),
    }
}

/// PUT /api/v1/meta/{key} — записать значение (требует admin JWT).
/// 201 если ключ создан, 200 если значение заменено.
async fn put_meta(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(key): Path<String>,
    Json(body): Json<MetaValue>,
) -> Result<(StatusCode, Json<SetMetaResponse>), AppError> {
    let previous = state.settings().set(&key, &body.value).await?;
    tracing::debug!("Настройку {key} изменил {}", claims.username);

    let status = if previous.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(SetMetaResponse { previous })))
}
