//! Типы ошибок каталога серверов.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::{sqlx, DbErr, RuntimeErr, SqlErr};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Неверные данные: {0}")]
    Validation(String),

    #[error("Не найдено: {0}")]
    NotFound(String),

    #[error("Конфликт: {0}")]
    Conflict(String),

    #[error("Не авторизован: {0}")]
    Unauthorized(String),

    /// Хранилище временно недоступно, запрос стоит повторить.
    #[error("Хранилище недоступно: {0}")]
    Unavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(e: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
            return AppError::Conflict(detail);
        }
        if is_transient(&e) {
            return AppError::Unavailable(e.to_string());
        }
        AppError::Internal(e.to_string())
    }
}

/// Ошибка хранилища, после которой запрос имеет смысл повторить.
fn is_transient(e: &DbErr) -> bool {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(RuntimeErr::SqlxError(err)) | DbErr::Query(RuntimeErr::SqlxError(err)) => {
            match err {
                sqlx::Error::Database(db_err) => is_busy(&**db_err),
                sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => true,
                _ => false,
            }
        }
        _ => false,
    }
}

/// SQLite: SQLITE_BUSY / SQLITE_LOCKED (с учётом расширенных кодов).
/// Postgres: конфликт сериализации, deadlock, блокировка, перегрузка.
fn is_busy(err: &dyn sqlx::error::DatabaseError) -> bool {
    let Some(code) = err.code() else {
        return false;
    };
    if err.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some() {
        return code
            .parse::<i32>()
            .map(|c| matches!(c & 0xff, 5 | 6))
            .unwrap_or(false);
    }
    matches!(code.as_ref(), "40001" | "40P01" | "55P03" | "57P01" | "53300")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let err = DbErr::Conn(sea_orm::RuntimeErr::Internal("connection refused".into()));
        assert!(matches!(AppError::from(err), AppError::Unavailable(_)));

        let err = DbErr::Custom("что-то сломалось".into());
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }

    #[test]
    fn test_pool_failures_inside_statements_are_transient() {
        for err in [
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::WorkerCrashed,
        ] {
            let err = DbErr::Exec(RuntimeErr::SqlxError(err));
            assert!(matches!(AppError::from(err), AppError::Unavailable(_)));
        }

        let err = DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::RowNotFound));
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }
}
