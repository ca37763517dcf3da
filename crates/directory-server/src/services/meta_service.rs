//! Глобальные настройки процесса поверх таблицы meta.

use crate::clock::format_timestamp;
use crate::error::AppError;
use chrono::Utc;
use directory_entities::meta::{ActiveModel, Column, Entity as MetaEntity};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Минимальная версия клиента, с которой разрешено подключаться.
pub const MIN_CLIENT_VERSION: &str = "minClientVersion";

/// Режим обслуживания ("true" / "false").
pub const MAINTENANCE_MODE: &str = "maintenanceMode";

const MAX_KEY_LEN: usize = 128;
const MAX_VALUE_LEN: usize = 4096;
const MAX_SET_ATTEMPTS: usize = 10;

/// Типизированный доступ к настройкам.
///
/// Отсутствующий ключ — это явное `None`, значение по умолчанию не подставляется.
#[derive(Clone)]
pub struct MetaSettings {
    db: DatabaseConnection,
}

impl MetaSettings {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        validate_key(key)?;
        let entry = MetaEntity::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.map(|e| e.value))
    }

    /// Записать значение (last-write-wins). Возвращает предыдущее значение.
    ///
    /// Запись условная: обновление проходит, только если в БД всё ещё лежит
    /// прочитанное значение, иначе чтение повторяется. Поэтому каждый из
    /// параллельных писателей получает ровно то значение, которое он заменил.
    pub async fn set(&self, key: &str, value: &str) -> Result<Option<String>, AppError> {
        validate_key(key)?;
        if value.chars().count() > MAX_VALUE_LEN {
            return Err(AppError::Validation(format!(
                "Значение длиннее {MAX_VALUE_LEN} символов"
            )));
        }
        validate_typed_value(key, value)?;

        for _ in 0..MAX_SET_ATTEMPTS {
            let previous = MetaEntity::find_by_id(key.to_string())
                .one(&self.db)
                .await?
                .map(|e| e.value);
            let updated_at = format_timestamp(Utc::now());

            let written = match &previous {
                Some(old) => {
                    MetaEntity::update_many()
                        .col_expr(Column::Value, Expr::value(value))
                        .col_expr(Column::UpdatedAt, Expr::value(updated_at))
                        .filter(Column::Key.eq(key))
                        .filter(Column::Value.eq(old.as_str()))
                        .exec(&self.db)
                        .await?
                        .rows_affected
                        > 0
                }
                None => {
                    let entry = ActiveModel {
                        key: Set(key.to_string()),
                        value: Set(value.to_string()),
                        updated_at: Set(updated_at),
                    };
                    MetaEntity::insert(entry)
                        .on_conflict(OnConflict::column(Column::Key).do_nothing().to_owned())
                        .exec_without_returning(&self.db)
                        .await?
                        > 0
                }
            };

            if written {
                tracing::info!("Настройка {key} = {value:?} (было: {previous:?})");
                return Ok(previous);
            }
            tracing::debug!("Настройку {key} изменили параллельно, повторяю");
        }

        Err(AppError::Unavailable(format!(
            "Настройка {key} постоянно меняется, повторите запрос"
        )))
    }

    pub async fn min_client_version(&self) -> Result<Option<String>, AppError> {
        self.get(MIN_CLIENT_VERSION).await
    }

    /// Режим обслуживания. Нечитаемое значение — ошибка, а не `false`.
    pub async fn maintenance_mode(&self) -> Result<Option<bool>, AppError> {
        match self.get(MAINTENANCE_MODE).await? {
            // set() такое не пропустит, значит значение испорчено в самой БД
            Some(raw) => parse_flag(&raw).map(Some).ok_or_else(|| {
                AppError::Internal(format!(
                    "{MAINTENANCE_MODE}: в БД лежит {raw:?} вместо true/false"
                ))
            }),
            None => Ok(None),
        }
    }

    pub async fn set_maintenance_mode(&self, enabled: bool) -> Result<Option<String>, AppError> {
        self.set(MAINTENANCE_MODE, &enabled.to_string()).await
    }
}

/// Значения типизированных ключей проверяются до записи.
fn validate_typed_value(key: &str, value: &str) -> Result<(), AppError> {
    match key {
        MAINTENANCE_MODE if parse_flag(value).is_none() => Err(AppError::Validation(format!(
            "{MAINTENANCE_MODE}: ожидается true/false, а не {value:?}"
        ))),
        MIN_CLIENT_VERSION if value.trim().is_empty() => Err(AppError::Validation(format!(
            "{MIN_CLIENT_VERSION} не может быть пустым"
        ))),
        _ => Ok(()),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    raw.trim().parse().ok()
}

fn validate_key(key: &str) -> Result<(), AppError> {
    if key.trim().is_empty() {
        return Err(AppError::Validation("Ключ не может быть пустым".into()));
    }
    if key.chars().count() > MAX_KEY_LEN {
        return Err(AppError::Validation(format!(
            "Ключ длиннее {MAX_KEY_LEN} символов"
        )));
    }
    Ok(())
}
