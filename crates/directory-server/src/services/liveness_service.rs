//! Фоновый обход: деактивация серверов без heartbeat.
//!
//! Обход только понижает записи до `active = false` и никогда их не удаляет
//! и не активирует. Вернуть сервер в каталог может лишь свежий heartbeat.

use crate::clock::parse_timestamp;
use crate::liveness::{Liveness, LivenessPolicy};
use chrono::{DateTime, Utc};
use directory_entities::servers::{Column, Entity as ServerEntity, Model};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Итог одного обхода.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Сколько активных записей просмотрено
    pub examined: usize,
    /// Сколько деактивировано
    pub demoted: usize,
    /// Сколько пропущено: heartbeat успел обновить запись после чтения
    pub superseded: usize,
    /// Сколько записей не удалось обработать
    pub failed: usize,
}

/// Запустить цикл обхода до сигнала завершения.
pub async fn run_sweep_loop(
    db: DatabaseConnection,
    policy: LivenessPolicy,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(policy.sweep_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        "Обход живости: порог {:?}, период {:?}",
        policy.staleness(),
        policy.sweep_interval()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            // Единственный сигнал в канале — завершение
            _ = shutdown_rx.changed() => break,
        }

        match sweep_once(&db, &policy, Utc::now()).await {
            Ok(report) if report.demoted > 0 || report.failed > 0 => {
                tracing::info!(
                    "Обход: просмотрено {}, деактивировано {}, пропущено {}, ошибок {}",
                    report.examined,
                    report.demoted,
                    report.superseded,
                    report.failed
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Ошибка обхода реестра серверов: {e}"),
        }
    }

    tracing::info!("Обход живости остановлен");
}

/// Один проход по всем активным записям.
///
/// Ошибка возвращается только если не удалось прочитать список. Сбой на
/// отдельной записи логируется, запись остаётся как была.
pub async fn sweep_once(
    db: &DatabaseConnection,
    policy: &LivenessPolicy,
    now: DateTime<Utc>,
) -> Result<SweepReport, DbErr> {
    let active = ServerEntity::find()
        .filter(Column::Active.eq(true))
        .all(db)
        .await?;

    let mut report = SweepReport {
        examined: active.len(),
        ..SweepReport::default()
    };

    for server in active {
        let Some(created_at) = parse_timestamp(&server.created_at) else {
            tracing::warn!(
                "Сервер {}: нечитаемый created_at {:?}, пропускаю",
                server.id,
                server.created_at
            );
            report.failed += 1;
            continue;
        };
        let last_seen = match server.last_seen.as_deref().map(parse_timestamp) {
            Some(None) => {
                tracing::warn!(
                    "Сервер {}: нечитаемый last_seen {:?}, пропускаю",
                    server.id,
                    server.last_seen
                );
                report.failed += 1;
                continue;
            }
            Some(Some(ts)) => Some(ts),
            None => None,
        };

        if policy.evaluate(last_seen, created_at, now) == Liveness::Active {
            continue;
        }

        match demote_if_unchanged(db, &server).await {
            Ok(true) => {
                tracing::info!(
                    "Деактивирую сервер {} «{}» (последний heartbeat: {})",
                    server.id,
                    server.name,
                    server.last_seen.as_deref().unwrap_or("никогда")
                );
                report.demoted += 1;
            }
            Ok(false) => {
                tracing::debug!("Сервер {} обновился во время обхода, не трогаю", server.id);
                report.superseded += 1;
            }
            Err(e) => {
                tracing::error!("Не удалось деактивировать сервер {}: {e}", server.id);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Деактивировать запись, только если её `last_seen` всё ещё равен снимку.
/// false — запись успел обновить heartbeat (или её удалили).
pub async fn demote_if_unchanged(db: &DatabaseConnection, snapshot: &Model) -> Result<bool, DbErr> {
    let last_seen_unchanged = match &snapshot.last_seen {
        Some(ts) => Column::LastSeen.eq(ts.as_str()),
        None => Column::LastSeen.is_null(),
    };

    let result = ServerEntity::update_many()
        .col_expr(Column::Active, Expr::value(false))
        .filter(Column::Id.eq(snapshot.id.as_str()))
        .filter(Column::Active.eq(true))
        .filter(last_seen_unchanged)
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}
