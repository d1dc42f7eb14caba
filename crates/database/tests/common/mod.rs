//! Shared fixture for the tests that need a live PostgreSQL server.
//!
//! Connection settings come from `config.toml` / `DISCOTECA__DATABASE__*`,
//! falling back to the defaults (localhost:5432, aed_db, aed_user).
//! Run with: `cargo test -p database -- --ignored --test-threads=1`

#![allow(dead_code)]

use configuration::DbConfig;
use core_types::{ArtistInfo, NewRecord};
use database::{DbRepository, PgConnection, connect, ensure_schema, remove_reference_guard};
use tokio::sync::{Mutex, MutexGuard};

/// Every test rewrites the same tables, so they must not overlap.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub async fn lock() -> MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub fn test_config() -> DbConfig {
    configuration::load_config()
        .map(|config| config.database)
        .unwrap_or_default()
}

pub async fn open() -> PgConnection {
    connect(&test_config()).await.unwrap()
}

/// Empties every table and resets the id sequences.
pub async fn truncate_all(conn: &mut PgConnection) {
    sqlx::query("TRUNCATE ventas, discos, artistas RESTART IDENTITY CASCADE")
        .execute(&mut *conn)
        .await
        .unwrap();
}

/// Check constraints some tests add so that a write is refused by the server.
pub const REJECT_CUSTOMER_CHECK: &str =
    "ALTER TABLE ventas ADD CONSTRAINT ventas_reject_bad_customer CHECK ((detalle).customer_name <> 'Bad')";
pub const REJECT_GENRE_CHECK: &str =
    "ALTER TABLE discos ADD CONSTRAINT discos_reject_bad_genre CHECK (NOT ('Bad' = ANY (generos)))";

pub async fn drop_rejecting_checks(conn: &mut PgConnection) {
    for statement in [
        "ALTER TABLE ventas DROP CONSTRAINT IF EXISTS ventas_reject_bad_customer",
        "ALTER TABLE discos DROP CONSTRAINT IF EXISTS discos_reject_bad_genre",
    ] {
        sqlx::query(statement).execute(&mut *conn).await.unwrap();
    }
}

pub async fn execute(conn: &mut PgConnection, statement: &str) {
    sqlx::query(statement).execute(&mut *conn).await.unwrap();
}

/// Brings the database to the known starting state used by every scenario:
/// artists 1 (Aimer) and 2 (Vaundy), and record 1 ("Deep Down") by artist 1.
pub async fn prepare_test_database() -> PgConnection {
    let mut conn = open().await;
    ensure_schema(&mut conn).await.unwrap();
    remove_reference_guard(&mut conn).await.unwrap();
    drop_rejecting_checks(&mut conn).await;
    truncate_all(&mut conn).await;

    let mut repo = DbRepository::new(&mut conn);
    let aimer = repo
        .add_artist(&ArtistInfo::new("Aimer", "Desconocido", "Japonesa"))
        .await
        .unwrap();
    repo.add_artist(&ArtistInfo::new("Vaundy", "Desconocido", "Japonesa"))
        .await
        .unwrap();
    repo.add_record(&NewRecord::new("Deep Down", 2022, &["Pop", "Anime", "Rock"], vec![aimer]))
        .await
        .unwrap();

    conn
}

pub async fn count_rows(conn: &mut PgConnection, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut *conn)
        .await
        .unwrap()
}
