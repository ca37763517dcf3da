//! Приём heartbeat: upsert записи сервера по идентичности.

use crate::clock::format_timestamp;
use crate::error::AppError;
use crate::services::directory_service::parse_id;
use chrono::{DateTime, Utc};
use directory_entities::servers::{ActiveModel, Column, Entity as ServerEntity, Model};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 253;
const MAX_ATTEMPTS: usize = 3;

/// Данные, которые сервер присылает в heartbeat.
///
/// `id` — ранее выданный идентификатор. Без него сервер находится по паре
/// address+port. Поля, которых нет в запросе, у существующей записи не меняются.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
}

struct Validated {
    id: Option<Uuid>,
    name: Option<String>,
    endpoint: Option<(String, u16)>,
}

/// Как создаётся новая запись.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Неявная регистрация первым heartbeat: `last_seen = now`
    Heartbeat,
    /// Явная регистрация: heartbeat ещё не было, `last_seen` пуст
    Register,
}

/// Принять heartbeat в текущий момент.
pub async fn heartbeat(db: &DatabaseConnection, data: HeartbeatData) -> Result<Model, AppError> {
    heartbeat_at(db, data, Utc::now()).await
}

/// Явная регистрация в текущий момент.
pub async fn register(db: &DatabaseConnection, data: HeartbeatData) -> Result<Model, AppError> {
    register_at(db, data, Utc::now()).await
}

/// Явная регистрация: адрес и порт обязательны.
///
/// Новая запись создаётся без `last_seen`, и порог устаревания отсчитывается
/// от `created_at`, пока не придёт первый heartbeat. Повторная регистрация
/// уже известного сервера ведёт себя как heartbeat.
pub async fn register_at(
    db: &DatabaseConnection,
    data: HeartbeatData,
    now: DateTime<Utc>,
) -> Result<Model, AppError> {
    if data.address.is_none() || data.port.is_none() {
        return Err(AppError::Validation(
            "address и port обязательны для регистрации".into(),
        ));
    }
    upsert(db, data, now, Origin::Register).await
}

/// Принять heartbeat с заданным временем.
///
/// Неизвестная идентичность означает неявную регистрацию. `last_seen` никогда
/// не уменьшается: heartbeat со временем раньше сохранённого ничего не меняет
/// и возвращает текущую запись.
pub async fn heartbeat_at(
    db: &DatabaseConnection,
    data: HeartbeatData,
    now: DateTime<Utc>,
) -> Result<Model, AppError> {
    upsert(db, data, now, Origin::Heartbeat).await
}

async fn upsert(
    db: &DatabaseConnection,
    data: HeartbeatData,
    now: DateTime<Utc>,
    origin: Origin,
) -> Result<Model, AppError> {
    let req = validate(data)?;
    let now = format_timestamp(now);

    for _ in 0..MAX_ATTEMPTS {
        if let Some(existing) = resolve(db, &req).await? {
            if let Some(record) = touch(db, &existing, &req, &now).await? {
                return Ok(record);
            }
            // Запись удалили между поиском и обновлением
            continue;
        }

        let Some((address, port)) = &req.endpoint else {
            return Err(AppError::Validation(
                "address и port обязательны при первой регистрации".into(),
            ));
        };

        if let Some(record) = insert(db, &req, address, *port, &now, origin).await? {
            tracing::info!(
                "Зарегистрирован сервер {} «{}» ({}:{})",
                record.id,
                record.name,
                record.address,
                record.port
            );
            return Ok(record);
        }
        tracing::debug!("Гонка регистрации {address}:{port}, повторяю через обновление");
    }

    Err(AppError::Internal(
        "Не удалось применить heartbeat: запись постоянно меняется".into(),
    ))
}

fn validate(data: HeartbeatData) -> Result<Validated, AppError> {
    let id = data.id.as_deref().map(parse_id).transpose()?;

    let name = match data.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::Validation("name не может быть пустым".into()));
            }
            if name.chars().count() > MAX_NAME_LEN {
                return Err(AppError::Validation(format!(
                    "name длиннее {MAX_NAME_LEN} символов"
                )));
            }
            Some(name)
        }
        None => None,
    };

    let endpoint = match (data.address, data.port) {
        (Some(address), Some(port)) => Some((validate_address(&address)?, port)),
        (None, None) => None,
        _ => {
            return Err(AppError::Validation(
                "address и port передаются только вместе".into(),
            ))
        }
    };

    if let Some((_, 0)) = endpoint {
        return Err(AppError::Validation("port должен быть от 1 до 65535".into()));
    }

    Ok(Validated { id, name, endpoint })
}

fn validate_address(address: &str) -> Result<String, AppError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::Validation("address не может быть пустым".into()));
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(AppError::Validation(format!(
            "address длиннее {MAX_ADDRESS_LEN} символов"
        )));
    }
    if address.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "address не может содержать пробелы".into(),
        ));
    }
    Ok(address.to_string())
}

/// Найти запись: сначала по id, затем по address+port.
async fn resolve<C: ConnectionTrait>(db: &C, req: &Validated) -> Result<Option<Model>, DbErr> {
    if let Some(id) = req.id {
        if let Some(record) = ServerEntity::find_by_id(id.to_string()).one(db).await? {
            return Ok(Some(record));
        }
    }
    if let Some((address, port)) = &req.endpoint {
        return ServerEntity::find()
            .filter(Column::Address.eq(address.as_str()))
            .filter(Column::Port.eq(i32::from(*port)))
            .one(db)
            .await;
    }
    Ok(None)
}

/// Обновить существующую запись и прочитать результат в одной транзакции.
/// None — записи больше нет.
async fn touch(
    db: &DatabaseConnection,
    existing: &Model,
    req: &Validated,
    now: &str,
) -> Result<Option<Model>, DbErr> {
    let txn = db.begin().await?;

    let mut update = ServerEntity::update_many()
        .col_expr(Column::LastSeen, Expr::value(now))
        .col_expr(Column::Active, Expr::value(true));
    if let Some(name) = &req.name {
        update = update.col_expr(Column::Name, Expr::value(name.as_str()));
    }
    if let Some((address, port)) = &req.endpoint {
        update = update
            .col_expr(Column::Address, Expr::value(address.as_str()))
            .col_expr(Column::Port, Expr::value(i32::from(*port)));
    }

    // Не даём last_seen уйти назад при переупорядоченной доставке
    let result = update
        .filter(Column::Id.eq(existing.id.as_str()))
        .filter(
            Condition::any()
                .add(Column::LastSeen.is_null())
                .add(Column::LastSeen.lte(now)),
        )
        .exec(&txn)
        .await?;

    let record = ServerEntity::find_by_id(existing.id.clone()).one(&txn).await?;
    txn.commit().await?;

    match &record {
        Some(current) if result.rows_affected == 0 => {
            tracing::debug!(
                "Heartbeat {} старше сохранённого ({:?}), запись не изменена",
                current.id,
                current.last_seen
            );
        }
        Some(current) if current.address != existing.address || current.port != existing.port => {
            tracing::info!(
                "Сервер {} сменил адрес: {}:{} -> {}:{}",
                current.id,
                existing.address,
                existing.port,
                current.address,
                current.port
            );
        }
        Some(current) => {
            if !existing.active {
                tracing::info!("Сервер {} снова активен", current.id);
            }
            tracing::debug!("Heartbeat: {}", current.id);
        }
        None => {}
    }

    Ok(record)
}

/// Вставить новую запись. None — параллельный запрос уже занял этот адрес.
async fn insert(
    db: &DatabaseConnection,
    req: &Validated,
    address: &str,
    port: u16,
    now: &str,
    origin: Origin,
) -> Result<Option<Model>, DbErr> {
    let record = Model {
        id: req.id.unwrap_or_else(Uuid::new_v4).to_string(),
        name: req
            .name
            .clone()
            .unwrap_or_else(|| format!("{address}:{port}")),
        address: address.to_string(),
        port: i32::from(port),
        active: true,
        last_seen: (origin == Origin::Heartbeat).then(|| now.to_string()),
        created_at: now.to_string(),
    };

    let model = ActiveModel {
        id: Set(record.id.clone()),
        name: Set(record.name.clone()),
        address: Set(record.address.clone()),
        port: Set(record.port),
        active: Set(record.active),
        last_seen: Set(record.last_seen.clone()),
        created_at: Set(record.created_at.clone()),
    };

    let inserted = ServerEntity::insert(model)
        .on_conflict(
            OnConflict::columns([Column::Address, Column::Port])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok((inserted > 0).then_some(record))
}
