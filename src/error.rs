use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection or query failure reported by the pool or the database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row {id} could not be decoded: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("task text must not be empty")]
    EmptyTask,

    #[error("unknown priority '{0}', expected low, medium or high")]
    UnknownPriority(String),

    #[error("unknown filter '{0}', expected all, active, completed, high, medium or low")]
    UnknownFilter(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
