use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetsError>;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Token exchange failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        SheetsError::Network(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for SheetsError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        SheetsError::Credentials(err.to_string())
    }
}
