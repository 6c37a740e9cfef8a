use crate::migrator::Migrator;
use crate::session::reload_session_cache;
use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

#[inline(always)]
pub fn get_db_pool() -> &'static DatabaseConnection {
    unsafe { DB_POOL.get_unchecked() }
}

fn pool_size(var: &str, default: u32) -> u32 {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<u32>()
            .unwrap_or_else(|_| panic!("{} cannot be parsed as an integer", var)),
        Err(_) => default,
    }
}

/// Opens the database URL and initializes the DB_POOL static.
/// Applies pending migrations and warms the session cache before returning.
pub async fn init_db(database_url: String) -> &'static DatabaseConnection {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(pool_size("DB_MAX_CONNECTIONS", 100))
        .min_connections(pool_size("DB_MIN_CONNECTIONS", 5))
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let pool = Database::connect(opt)
        .await
        .expect("Database connection was not established.");
    DB_POOL.set(pool).expect("init_db() called twice.");

    Migrator::up(get_db_pool(), None)
        .await
        .expect("Migrations failed to apply.");

    reload_session_cache(get_db_pool())
        .await
        .expect("failed to reload_session_cache");

    get_db_pool()
}
