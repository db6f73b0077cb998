use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// Primary result code SQLite reports for every constraint failure,
/// including `RAISE(ABORT, ...)` from triggers.
const SQLITE_CONSTRAINT: i64 = 19;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A write inside a client aggregate unit of work violated a constraint.
    /// The whole unit was rolled back.
    #[error("aggregate write failed: {reason}")]
    AggregateWriteFailed { reason: String },
    #[error("{entity} {id} not found")]
    EntityNotFound { entity: &'static str, id: i64 },
    #[error("constraint violated: {reason}")]
    Constraint { reason: String },
    #[error("credential could not be provisioned: {reason}")]
    Credential { reason: String },
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::EntityNotFound { entity, id }
    }

    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        StoreError::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    /// Folds constraint failures raised inside an aggregate unit of work into
    /// `AggregateWriteFailed`; other variants pass through untouched.
    pub(crate) fn into_aggregate_failure(self) -> Self {
        match self {
            StoreError::Constraint { reason } => StoreError::AggregateWriteFailed { reason },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::EntityNotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if is_constraint_violation(&**db) {
                return StoreError::Constraint {
                    reason: db.message().to_string(),
                };
            }
        }
        StoreError::StoreUnavailable(err)
    }
}

fn is_constraint_violation(db: &dyn DatabaseError) -> bool {
    match db.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => true,
        _ => db
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .is_some_and(|code| code & 0xff == SQLITE_CONSTRAINT),
    }
}
