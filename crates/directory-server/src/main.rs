//! Точка входа каталога игровых серверов.

use clap::Parser;
use directory_server::config::{hash_password, ServerConfig};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "directory-server",
    about = "Каталог выделенных игровых серверов с heartbeat"
)]
struct Cli {
    /// Адрес для прослушивания (host:port)
    #[arg(long, default_value = "0.0.0.0:3000", env = "DIRECTORY_LISTEN")]
    listen: String,

    /// URL базы данных
    #[arg(
        long,
        default_value = "sqlite:./directory.db?mode=rwc",
        env = "DATABASE_URL"
    )]
    db_url: String,

    /// Секунд без heartbeat до исключения из каталога
    #[arg(long, default_value_t = 90, env = "STALENESS_SECS")]
    staleness_secs: u64,

    /// Период обхода в секундах (по умолчанию треть порога)
    #[arg(long, env = "SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Секрет JWT (случайный если не задан)
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Имя пользователя администратора
    #[arg(long, default_value = "admin")]
    admin_username: String,

    /// Пароль администратора
    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логгера
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // JWT secret: из аргумента или генерируем случайный
    let jwt_secret = match cli.jwt_secret {
        Some(secret) => secret,
        None => {
            let mut buf = [0u8; 32];
            getrandom::fill(&mut buf)
                .map_err(|e| anyhow::anyhow!("Ошибка генерации JWT secret: {e}"))?;
            hex::encode(buf)
        }
    };

    // Хэш пароля администратора
    let admin_password = cli.admin_password.unwrap_or_else(|| {
        tracing::warn!("Пароль администратора не задан, используется 'admin' (небезопасно!)");
        "admin".to_string()
    });

    let config = ServerConfig {
        listen: cli.listen,
        db_url: cli.db_url,
        staleness: Duration::from_secs(cli.staleness_secs),
        sweep_interval: cli.sweep_interval_secs.map(Duration::from_secs),
        jwt_secret,
        admin_username: cli.admin_username,
        admin_password_hash: hash_password(&admin_password),
    };

    directory_server::run(config).await
}
