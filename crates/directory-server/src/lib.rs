//! Каталог выделенных игровых серверов с отслеживанием живости по heartbeat.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod liveness;
pub mod services;


use api::AppState;
use config::ServerConfig;
use directory_migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::info;

/// Запустить каталог серверов.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // 1. Подключение к БД
    info!("Подключение к базе данных: {}", config.db_url);
    let db: DatabaseConnection = Database::connect(&config.db_url).await?;

    // 2. Автоматические миграции
    info!("Выполнение миграций...");
    Migrator::up(&db, None).await?;

    // 3. Состояние приложения
    let state = AppState {
        db: db.clone(),
        jwt_secret: config.jwt_secret.clone(),
        admin_username: config.admin_username.clone(),
        admin_password_hash: config.admin_password_hash.clone(),
    };

    // 4. Маршрутизатор
    let app = api::build_router(state);

    // 5. Graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Получен сигнал завершения, останавливаю сервер...");
        let _ = shutdown_tx.send(true);
    });

    // 6. Фоновый обход живости
    let sweeper = tokio::spawn(services::liveness_service::run_sweep_loop(
        db.clone(),
        config.liveness_policy(),
        shutdown_rx.clone(),
    ));

    // 7. Запуск HTTP
    let addr: SocketAddr = config.listen.parse()?;
    info!("Каталог серверов слушает {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let mut http_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*http_shutdown.borrow_and_update() {
                if http_shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    sweeper.await.ok();
    db.close().await?;
    info!("Каталог серверов остановлен");
    Ok(())
}
