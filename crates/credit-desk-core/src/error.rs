use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditDeskError {
    #[error("Not found: {entity} {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        /// HTTP status returned by the generator, when one was received.
        status: Option<u16>,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CreditDeskError {
    pub fn company_not_found(id: i64) -> Self {
        CreditDeskError::NotFound {
            entity: "company".into(),
            id: id.to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CreditDeskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        CreditDeskError::Generation {
            message: message.into(),
            status: None,
        }
    }
}

impl From<serde_json::Error> for CreditDeskError {
    fn from(e: serde_json::Error) -> Self {
        CreditDeskError::Serialization(e.to_string())
    }
}

impl From<::config::ConfigError> for CreditDeskError {
    fn from(e: ::config::ConfigError) -> Self {
        CreditDeskError::invalid("config", e.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for CreditDeskError {
    fn from(e: rusqlite::Error) -> Self {
        CreditDeskError::Persistence(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for CreditDeskError {
    fn from(e: reqwest::Error) -> Self {
        CreditDeskError::Generation {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}

impl From<tokio::task::JoinError> for CreditDeskError {
    fn from(e: tokio::task::JoinError) -> Self {
        CreditDeskError::Persistence(format!("store task failed: {e}"))
    }
}
