use core_types::{CoreError, Entity};
use thiserror::Error;

/// Every way a database operation can fail.
///
/// Driver errors are classified once, when they leave sqlx; callers branch on
/// [`DbError::kind`].
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("No {entity} exists with id {id}")]
    NotFound { entity: Entity, id: i32 },

    #[error("Integrity constraint violated: {0}")]
    Integrity(#[source] sqlx::Error),

    #[error("Database unavailable or statement rejected: {0}")]
    Operational(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// A copyable summary of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A precondition failed before any statement was issued.
    Validation,
    /// The targeted row does not exist; nothing was changed.
    NotFound,
    /// SQLSTATE class 23.
    Integrity,
    /// Connectivity problems and rejected statements (syntax, permissions).
    Operational,
    /// Everything else the engine reports.
    Database,
}

impl DbError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DbError::Validation(_) => FailureKind::Validation,
            DbError::NotFound { .. } => FailureKind::NotFound,
            DbError::Integrity(_) => FailureKind::Integrity,
            DbError::Operational(_) => FailureKind::Operational,
            DbError::Database(_) => FailureKind::Database,
        }
    }

    /// The SQLSTATE reported by the server, when there is one.
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            DbError::Integrity(e) | DbError::Operational(e) | DbError::Database(e) => e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned()),
            _ => None,
        }
    }
}

/// Maps a five-character SQLSTATE to the failure it represents.
pub fn classify_sqlstate(code: &str) -> FailureKind {
    match code.get(..2) {
        // integrity_constraint_violation
        Some("23") => FailureKind::Integrity,
        // connection_exception, invalid_authorization_specification, resource and
        // server-side failures, configuration_file_error, fdw_error
        Some("08") | Some("26") | Some("27") | Some("28") | Some("34") | Some("53") | Some("54")
        | Some("55") | Some("57") | Some("58") | Some("F0") | Some("HV") => FailureKind::Operational,
        // rejected statements: syntax or access rules, unknown catalog or schema,
        // case_not_found, cardinality_violation, with_check_option_violation
        Some("20") | Some("21") | Some("3D") | Some("3F") | Some("42") | Some("44") => {
            FailureKind::Operational
        }
        _ => FailureKind::Database,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db) => match db.code() {
                Some(code) => classify_sqlstate(&code),
                None => FailureKind::Database,
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => FailureKind::Operational,
            _ => FailureKind::Database,
        };

        match kind {
            FailureKind::Integrity => DbError::Integrity(err),
            FailureKind::Operational => DbError::Operational(err),
            _ => DbError::Database(err),
        }
    }
}
