//! Политика живости: когда сервер считается устаревшим.
//!
//! Здесь нет ввода-вывода. Решение принимается только по временным меткам
//! записи и текущему времени, поэтому политику можно проверять отдельно от
//! того, как и когда приходят heartbeat.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Состояние записи с точки зрения политики.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Active,
    Stale,
}

/// Порог устаревания и период обхода.
#[derive(Debug, Clone, Copy)]
pub struct LivenessPolicy {
    staleness: Duration,
    sweep_interval: Duration,
}

impl LivenessPolicy {
    /// Период обхода по умолчанию — треть порога.
    pub fn new(staleness: Duration, sweep_interval: Option<Duration>) -> Self {
        Self {
            staleness,
            sweep_interval: sweep_interval.unwrap_or(staleness / 3),
        }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Оценить запись. Точкой отсчёта служит `last_seen`, а если heartbeat
    /// ещё не было — `created_at`. Устаревшей считается запись, у которой
    /// прошло строго больше порога.
    pub fn evaluate(
        &self,
        last_seen: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Liveness {
        let reference = last_seen.unwrap_or(created_at);
        let threshold = TimeDelta::from_std(self.staleness).unwrap_or(TimeDelta::MAX);

        if now.signed_duration_since(reference) > threshold {
            Liveness::Stale
        } else {
            Liveness::Active
        }
    }
}

impl Default for LivenessPolicy {
    /// 90 секунд: три пропущенных heartbeat при интервале 30 секунд.
    fn default() -> Self {
        Self::new(Duration::from_secs(90), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_sweep_is_third_of_staleness() {
        let policy = LivenessPolicy::default();
        assert_eq!(policy.staleness(), Duration::from_secs(90));
        assert_eq!(policy.sweep_interval(), Duration::from_secs(30));

        let custom = LivenessPolicy::new(Duration::from_secs(60), Some(Duration::from_secs(5)));
        assert_eq!(custom.sweep_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_staleness_boundary() {
        let policy = LivenessPolicy::default();
        let created = now() - TimeDelta::hours(1);
        let eps = TimeDelta::milliseconds(1);

        let just_fresh = now() - (TimeDelta::seconds(90) - eps);
        let exactly = now() - TimeDelta::seconds(90);
        let just_stale = now() - (TimeDelta::seconds(90) + eps);

        assert_eq!(policy.evaluate(Some(just_fresh), created, now()), Liveness::Active);
        assert_eq!(policy.evaluate(Some(exactly), created, now()), Liveness::Active);
        assert_eq!(policy.evaluate(Some(just_stale), created, now()), Liveness::Stale);
    }

    #[test]
    fn test_never_seen_measured_from_created_at() {
        let policy = LivenessPolicy::default();

        let fresh = now() - TimeDelta::seconds(10);
        assert_eq!(policy.evaluate(None, fresh, now()), Liveness::Active);

        let old = now() - TimeDelta::seconds(91);
        assert_eq!(policy.evaluate(None, old, now()), Liveness::Stale);
    }

    #[test]
    fn test_last_seen_takes_precedence_over_created_at() {
        let policy = LivenessPolicy::default();
        let created = now() - TimeDelta::days(3);
        let seen = now() - TimeDelta::seconds(5);

        assert_eq!(policy.evaluate(Some(seen), created, now()), Liveness::Active);
    }

    #[test]
    fn test_future_heartbeat_is_active() {
        // Часы узла могут немного убежать вперёд относительно момента оценки
        let policy = LivenessPolicy::default();
        let ahead = now() + TimeDelta::seconds(2);
        assert_eq!(policy.evaluate(Some(ahead), now(), now()), Liveness::Active);
    }
}
