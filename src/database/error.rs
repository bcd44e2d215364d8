use crate::refund::error::RefundError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
}

#[derive(Debug, Clone, Error)]
pub enum DatabaseErrorKind {
    #[error("Row not found")]
    NotFound,

    #[error("Database connection error: {message}")]
    Connection { message: String },

    #[error("Database query error: {message}")]
    Query { message: String },

    #[error("Database error: {message}")]
    Unknown { message: String },
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &DatabaseErrorKind {
        &self.kind
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::NotFound)
    }

    pub fn from_sqlx(error: sqlx::Error) -> Self {
        let kind = match &error {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseErrorKind::Connection {
                    message: error.to_string(),
                }
            }
            _ => DatabaseErrorKind::Query {
                message: error.to_string(),
            },
        };
        Self { kind }
    }
}

impl From<DatabaseError> for RefundError {
    fn from(error: DatabaseError) -> Self {
        if error.is_not_found() {
            RefundError::ProviderLookup {
                message: "transaction not found".to_string(),
            }
        } else {
            RefundError::Unknown {
                message: error.to_string(),
            }
        }
    }
}
