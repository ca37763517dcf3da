//! Конфигурация каталога серверов.

use crate::liveness::LivenessPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Адрес для прослушивания (например "0.0.0.0:3000")
    pub listen: String,

    /// URL подключения к БД (sqlite или postgres)
    pub db_url: String,

    /// Через сколько без heartbeat сервер пропадает из каталога
    pub staleness: Duration,

    /// Период обхода; None — треть порога устаревания
    pub sweep_interval: Option<Duration>,

    /// Секрет JWT (генерируется случайно если не задан)
    pub jwt_secret: String,

    /// Имя пользователя администратора
    pub admin_username: String,

    /// Хэш пароля администратора (SHA-256 hex)
    pub admin_password_hash: String,
}

impl ServerConfig {
    /// Проверить согласованность порога и периода обхода.
    pub fn validate(&self) -> Result<(), String> {
        if self.staleness.is_zero() {
            return Err("Порог устаревания должен быть больше нуля".into());
        }
        let policy = self.liveness_policy();
        if policy.sweep_interval().is_zero() {
            return Err("Период обхода должен быть больше нуля".into());
        }
        if policy.sweep_interval() >= policy.staleness() {
            return Err(format!(
                "Период обхода ({:?}) должен быть меньше порога устаревания ({:?})",
                policy.sweep_interval(),
                policy.staleness()
            ));
        }
        Ok(())
    }

    pub fn liveness_policy(&self) -> LivenessPolicy {
        LivenessPolicy::new(self.staleness, self.sweep_interval)
    }
}

/// Хэшировать пароль (SHA-256 hex).
pub fn hash_password(password: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(password.as_bytes());
    hex::encode(hash)
}

/// Проверить пароль по хэшу.
pub fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash
}
