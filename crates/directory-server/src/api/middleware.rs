//! JWT-аутентификация операторов каталога.

use crate::api::AppState;
use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

/// Время жизни токена оператора.
const ADMIN_TOKEN_TTL_SECS: usize = 24 * 3600;

/// Claims JWT-токена администратора.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}

/// Экстрактор аутентифицированного администратора.
pub struct AdminUser(pub AdminClaims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let claims = decode_token(token, &state.jwt_secret)?;
        Ok(AdminUser(claims))
    }
}

/// Создать JWT-токен администратора.
pub fn create_admin_token(username: &str, jwt_secret: &str) -> Result<String, AppError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = AdminClaims {
        sub: username.to_string(),
        username: username.to_string(),
        exp: now + ADMIN_TOKEN_TTL_SECS,
        iat: now,
    };
    let key = jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes());
    jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &key)
        .map_err(|e| AppError::Internal(format!("Ошибка создания токена: {e}")))
}

// ── Вспомогательные функции ──────────────────────────────────────────────────

fn extract_bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Отсутствует заголовок Authorization".into()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Ожидается Bearer токен".into()))
}

fn decode_token(token: &str, jwt_secret: &str) -> Result<AdminClaims, AppError> {
    let key = jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = jsonwebtoken::Validation::default();
    jsonwebtoken::decode::<AdminClaims>(token, &key, &validation)
        .map(|d| d.claims)
        .map_err(|e| AppError::Unauthorized(format!("Невалидный токен: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let token = create_admin_token("operator", "secret").unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.username, "operator");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let token = create_admin_token("operator", "secret").unwrap();
        assert!(matches!(
            decode_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
