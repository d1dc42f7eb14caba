use crate::error::DbError;
use configuration::DbConfig;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

/// Translates the application's connection settings into sqlx options.
pub fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.dbname)
        .username(&config.user)
        .password(&config.password)
}

/// Opens a single connection to the PostgreSQL database.
///
/// There is deliberately no pool and no retry: callers get one connection
/// and must check the result. Failures are logged here before being returned.
pub async fn connect(config: &DbConfig) -> Result<PgConnection, DbError> {
    tracing::debug!(host = %config.host, port = config.port, dbname = %config.dbname, "Connecting to the database.");

    match PgConnection::connect_with(&connect_options(config)).await {
        Ok(conn) => {
            tracing::info!(host = %config.host, dbname = %config.dbname, "Database connection established.");
            Ok(conn)
        }
        Err(e) => {
            tracing::error!(error = %e, host = %config.host, dbname = %config.dbname, "Failed to connect to the database.");
            Err(DbError::from(e))
        }
    }
}

/// Closes a connection, sending the terminate message to the server.
pub async fn close(conn: PgConnection) -> Result<(), DbError> {
    conn.close().await?;
    tracing::debug!("Database connection closed.");
    Ok(())
}

/// Closes `conn` and hands back `result`.
///
/// A failure to close is only logged: by then the operation has already
/// committed or failed on its own.
pub async fn close_after<T>(conn: PgConnection, result: Result<T, DbError>) -> Result<T, DbError> {
    if let Err(close_err) = close(conn).await {
        tracing::warn!(
            operation_ok = result.is_ok(),
            error = %close_err,
            "Failed to close the connection."
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_carry_every_setting() {
        let config = DbConfig {
            host: "records.example.org".to_string(),
            port: 6543,
            dbname: "shop".to_string(),
            user: "clerk".to_string(),
            password: "secret".to_string(),
        };

        let options = connect_options(&config);

        assert_eq!(options.get_host(), "records.example.org");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("shop"));
        assert_eq!(options.get_username(), "clerk");
    }
}
