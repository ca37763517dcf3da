//! Сущности sea-orm реестра игровых серверов.

pub mod meta;
pub mod servers;
