use sea_orm::{DbBackend, DbErr, RuntimeErr};

/// PostgreSQL `undefined_function`: the routine does not exist or no overload
/// matches the supplied (named) arguments.
const SQLSTATE_UNDEFINED_FUNCTION: &str = "42883";

/// PostgreSQL `wrong_object_type`, raised when `CALL` targets a function.
const SQLSTATE_WRONG_OBJECT_TYPE: &str = "42809";

#[derive(thiserror::Error, Debug)]
pub enum ProcError {
    #[error("Stored procedure resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Stored procedure resource is not valid UTF-8: {0}")]
    InvalidResource(String),

    #[error("Invalid stored procedure parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported database backend: {0:?}")]
    UnsupportedBackend(DbBackend),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProcError {
    /// SQLSTATE reported by the server, when the failure came from the database
    pub fn sqlstate(&self) -> Option<String> {
        let runtime = match self {
            ProcError::Database(DbErr::Exec(err))
            | ProcError::Database(DbErr::Query(err))
            | ProcError::Database(DbErr::Conn(err)) => err,
            _ => return None,
        };

        match runtime {
            RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
                db_err.code().map(|code| code.into_owned())
            }
            _ => None,
        }
    }

    /// The server rejected the invocation because the routine (or a matching
    /// signature) is not installed
    pub fn is_missing_routine(&self) -> bool {
        matches!(
            self.sqlstate().as_deref(),
            Some(SQLSTATE_UNDEFINED_FUNCTION) | Some(SQLSTATE_WRONG_OBJECT_TYPE)
        )
    }
}

// Migrations speak `DbErr`; packaging failures abort the run as migration errors
impl From<ProcError> for DbErr {
    fn from(err: ProcError) -> Self {
        match err {
            ProcError::Database(db_err) => db_err,
            other => DbErr::Migration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcError>;
