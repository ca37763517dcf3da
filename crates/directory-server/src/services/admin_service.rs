//! Административный сервис: полный список, статистика, удаление.

use crate::error::AppError;
use crate::services::directory_service::parse_id;
use directory_entities::servers::{Column, Entity as ServerEntity, Model};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Получить список всех серверов (активных и неактивных).
pub async fn list_all_servers(db: &DatabaseConnection) -> Result<Vec<Model>, AppError> {
    let servers = ServerEntity::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(servers)
}

/// Статистика реестра серверов.
pub struct Stats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    /// Зарегистрированы, но ни одного heartbeat
    pub never_seen: u64,
}

/// Получить статистику по серверам.
pub async fn get_stats(db: &DatabaseConnection) -> Result<Stats, AppError> {
    let total = ServerEntity::find().count(db).await?;
    let active = ServerEntity::find()
        .filter(Column::Active.eq(true))
        .count(db)
        .await?;
    let never_seen = ServerEntity::find()
        .filter(Column::LastSeen.is_null())
        .count(db)
        .await?;

    Ok(Stats {
        total,
        active,
        inactive: total.saturating_sub(active),
        never_seen,
    })
}

/// Удалить сервер насовсем. false — такого сервера нет.
pub async fn delete_server(db: &DatabaseConnection, id: &str) -> Result<bool, AppError> {
    let id = parse_id(id)?;
    let result = ServerEntity::delete_by_id(id.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}
