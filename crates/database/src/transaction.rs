use sqlx::{Postgres, Transaction};

/// Rolls back `tx`, logging instead of failing when the rollback itself fails.
///
/// Rollback only runs on paths that already carry an error, and that error
/// is the one the caller needs to see.
pub(crate) async fn rollback(tx: Transaction<'_, Postgres>, operation: &'static str) {
    match tx.rollback().await {
        Ok(()) => tracing::debug!(operation, "Transaction rolled back."),
        Err(e) => tracing::warn!(operation, error = %e, "Rollback failed."),
    }
}
