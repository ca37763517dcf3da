//! Сервис каталога: чтение активных серверов для клиентов.

use crate::error::AppError;
use directory_entities::servers::{Column, Entity as ServerEntity, Model};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

/// Фильтр выборки каталога. Применяется только к активным серверам.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    /// Подстрока в имени сервера: буквально, без учёта регистра
    pub name_contains: Option<String>,
}

impl DirectoryFilter {
    pub fn by_name(fragment: impl Into<String>) -> Self {
        Self {
            name_contains: Some(fragment.into()),
        }
    }

    /// Проверка выполняется в Rust, а не через LIKE: `%` и `_` остаются
    /// обычными символами, а регистр сравнивается одинаково на любой БД.
    pub fn matches(&self, server: &Model) -> bool {
        match self.name_contains.as_deref().map(str::trim) {
            Some(fragment) if !fragment.is_empty() => server
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
            _ => true,
        }
    }
}

/// Получить активные серверы.
///
/// Порядок детерминирован (created_at, затем id): повторный запрос без
/// промежуточных записей возвращает тот же список в том же порядке.
pub async fn list_active(
    db: &DatabaseConnection,
    filter: &DirectoryFilter,
) -> Result<Vec<Model>, AppError> {
    let servers = ServerEntity::find()
        .filter(Column::Active.eq(true))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;

    Ok(servers
        .into_iter()
        .filter(|server| filter.matches(server))
        .collect())
}

/// Получить сервер по id (в любом состоянии).
pub async fn get_server(db: &DatabaseConnection, id: &str) -> Result<Option<Model>, AppError> {
    let id = parse_id(id)?;
    let server = ServerEntity::find_by_id(id.to_string()).one(db).await?;
    Ok(server)
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Некорректный id: {raw}")))
}
