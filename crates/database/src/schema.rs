//! DDL for the record shop.
//!
//! `discos.artistas_ids` and `sale_info.discos_comprados` are plain integer
//! arrays. PostgreSQL cannot put a foreign key on array elements, so the base
//! schema does not enforce them: a record may name an artist that was deleted
//! and a sale may list a record id that never existed. Callers that want the
//! artist references enforced opt in with [`install_reference_guard`]; the
//! read-only audit is `DbRepository::find_orphaned_references`.

use crate::connection::{close_after, connect};
use crate::error::DbError;
use crate::transaction::rollback;
use configuration::DbConfig;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Postgres, Transaction};

// Composite types have no `CREATE TYPE IF NOT EXISTS`, so existence is
// checked by name against the catalog.
const CREATE_TYPES: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'artist_type') THEN
        CREATE TYPE artist_type AS (
            nombre VARCHAR(50),
            apellido VARCHAR(50),
            nacionalidad VARCHAR(50)
        );
    END IF;
    IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'sale_info') THEN
        CREATE TYPE sale_info AS (
            customer_name VARCHAR(100),
            sale_date DATE,
            discos_comprados INTEGER[]
        );
    END IF;
END $$;
"#;

const CREATE_ARTISTS: &str = r#"
CREATE TABLE IF NOT EXISTS artistas (
    id_artista SERIAL PRIMARY KEY,
    info artist_type
)
"#;

const CREATE_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS discos (
    id_disco SERIAL PRIMARY KEY,
    titulo VARCHAR(100),
    lanzamiento INTEGER,
    generos TEXT[],
    artistas_ids INTEGER[]
)
"#;

const CREATE_SALES: &str = r#"
CREATE TABLE IF NOT EXISTS ventas (
    id_venta SERIAL PRIMARY KEY,
    detalle sale_info
)
"#;

const CREATE_GUARD_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION guard_artist_references() RETURNS trigger AS $$
BEGIN
    IF EXISTS (SELECT 1 FROM discos WHERE OLD.id_artista = ANY (artistas_ids)) THEN
        RAISE EXCEPTION 'artist % is still referenced by discos', OLD.id_artista
            USING ERRCODE = 'foreign_key_violation';
    END IF;
    RETURN OLD;
END;
$$ LANGUAGE plpgsql
"#;

const DROP_GUARD_TRIGGER: &str = "DROP TRIGGER IF EXISTS artistas_reference_guard ON artistas";

const CREATE_GUARD_TRIGGER: &str = r#"
CREATE TRIGGER artistas_reference_guard
    BEFORE DELETE ON artistas
    FOR EACH ROW EXECUTE FUNCTION guard_artist_references()
"#;

const DROP_GUARD_FUNCTION: &str = "DROP FUNCTION IF EXISTS guard_artist_references()";

/// Creates the composite types and tables that are missing. Safe to run repeatedly.
///
/// All statements run in one transaction; on failure nothing is left half-created.
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<(), DbError> {
    run_in_transaction(conn, "ensure_schema", &[CREATE_TYPES, CREATE_ARTISTS, CREATE_RECORDS, CREATE_SALES]).await?;
    tracing::info!("Schema is up to date.");
    Ok(())
}

/// Opens its own connection, runs [`ensure_schema`] and always closes the connection.
pub async fn ensure_schema_with_config(config: &DbConfig) -> Result<(), DbError> {
    let mut conn = connect(config).await?;
    let result = ensure_schema(&mut conn).await;
    close_after(conn, result).await
}

/// Makes deleting an artist fail while any record still lists it.
///
/// The trigger raises `foreign_key_violation` (SQLSTATE 23503), which
/// surfaces as [`DbError::Integrity`]. Running it again replaces the guard.
pub async fn install_reference_guard(conn: &mut PgConnection) -> Result<(), DbError> {
    run_in_transaction(
        conn,
        "install_reference_guard",
        &[CREATE_GUARD_FUNCTION, DROP_GUARD_TRIGGER, CREATE_GUARD_TRIGGER],
    )
    .await?;
    tracing::info!("Artist reference guard installed.");
    Ok(())
}

/// Removes the trigger and function added by [`install_reference_guard`].
pub async fn remove_reference_guard(conn: &mut PgConnection) -> Result<(), DbError> {
    run_in_transaction(conn, "remove_reference_guard", &[DROP_GUARD_TRIGGER, DROP_GUARD_FUNCTION]).await?;
    tracing::info!("Artist reference guard removed.");
    Ok(())
}

async fn run_in_transaction(
    conn: &mut PgConnection,
    operation: &'static str,
    statements: &[&str],
) -> Result<(), DbError> {
    let mut tx = conn.begin().await?;

    match execute_all(&mut tx, statements).await {
        Ok(()) => {
            tx.commit().await?;
            Ok(())
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "DDL failed.");
            rollback(tx, operation).await;
            Err(e)
        }
    }
}

async fn execute_all(tx: &mut Transaction<'_, Postgres>, statements: &[&str]) -> Result<(), DbError> {
    for statement in statements {
        sqlx::query(statement).execute(&mut **tx).await?;
    }
    Ok(())
}
