//! Database error type

/// Errors raised by the product store
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A statement inside the create transaction failed; nothing was kept.
    #[error("transaction for product '{id}' rolled back: {source}")]
    Transaction {
        id: String,
        #[source]
        source: Box<DbError>,
    },

    /// Constraint violation raised by a non-SQL store.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Connection queue is full.
    #[error("connection queue full ({limit} operations in flight)")]
    Saturated { limit: usize },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Wrap a failed statement as a rolled-back create.
    pub fn rolled_back(id: impl Into<String>, source: impl Into<DbError>) -> Self {
        Self::Transaction {
            id: id.into(),
            source: Box::new(source.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
