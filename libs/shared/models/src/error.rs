use thiserror::Error;

/// Shared error surface of the storage layer.
///
/// Reads report "no match" through empty collections or `None`; only writes
/// against a missing id produce `NotFound`. Input validation is the caller's
/// responsibility and is not re-checked here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{entity} {id} does not exist"))
    }
}
