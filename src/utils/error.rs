use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Credentials error: {0}")]
    CredentialsError(String),
    #[error("Firestore API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = AdminError::ApiError {
            status: 403,
            message: "Missing or insufficient permissions.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Firestore API error (403): Missing or insufficient permissions."
        );
    }
}
