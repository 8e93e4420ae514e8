use thiserror::Error;

use crate::api::ApiError;
use crate::auth::store::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Access denied")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Validation(_) => 2,
            AppError::Unauthenticated => 3,
            AppError::Unauthorized => 4,
            AppError::NotFound(_) => 5,
            AppError::Api(e) if e.is_not_found() => 5,
            AppError::Api(_) => 6,
            AppError::Storage(_) => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_exit_code() {
        let error = AppError::Validation(ValidationError::new("email", "must not be empty"));
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "Validation error: email: must not be empty");
    }

    #[test]
    fn test_auth_error_exit_codes() {
        assert_eq!(AppError::Unauthenticated.exit_code(), 3);
        assert_eq!(AppError::Unauthorized.exit_code(), 4);
    }

    #[test]
    fn test_not_found_from_backend() {
        let error = AppError::from(ApiError::Backend {
            status: 404,
            message: Some("Lead not found".to_string()),
        });
        assert_eq!(error.exit_code(), 5);
        assert_eq!(AppError::NotFound("lead".into()).exit_code(), 5);
    }

    #[test]
    fn test_other_backend_errors() {
        let error = AppError::from(ApiError::CircuitOpen("open".to_string()));
        assert_eq!(error.exit_code(), 6);
    }

    #[test]
    fn test_storage_error_exit_code() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(AppError::from(StoreError::from(io)).exit_code(), 7);
    }
}
