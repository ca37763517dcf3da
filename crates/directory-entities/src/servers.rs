//! Entity для таблицы servers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Запись выделенного игрового сервера.
///
/// Временные метки хранятся строками RFC 3339 фиксированной ширины (UTC,
/// микросекунды), поэтому строковое сравнение в БД совпадает с хронологическим.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "servers")]
pub struct Model {
    /// UUID, выдаётся при первой регистрации и больше не меняется
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Отображаемое имя
    pub name: String,

    /// Адрес для подключения клиентов (IP или хост)
    pub address: String,

    /// Порт для подключения клиентов
    pub port: i32,

    /// Виден ли сервер в каталоге
    pub active: bool,

    /// Время последнего принятого heartbeat (None — ещё ни одного)
    pub last_seen: Option<String>,

    /// Время первой регистрации
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
