//! Сервисный слой поверх хранилища.

pub mod admin_service;
pub mod directory_service;
pub mod heartbeat_service;
pub mod liveness_service;
pub mod meta_service;
