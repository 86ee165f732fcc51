//! Error types for the dictionary cache.

use thiserror::Error;

use crate::models::Category;

/// Result type alias using the dictionary's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dictionary operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Publish/subscribe transport failed or the subscription closed
    #[error("Pub/sub error: {0}")]
    PubSub(String),

    /// A per-row payload could not be decoded
    #[error("Decode error in {category}: {message}")]
    Decode { category: Category, message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a decode error for the given category.
    pub fn decode(category: Category, message: impl Into<String>) -> Self {
        Error::Decode {
            category,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_pubsub() {
        let err = Error::PubSub("subscription closed".to_string());
        assert_eq!(err.to_string(), "Pub/sub error: subscription closed");
    }

    #[test]
    fn test_error_display_decode() {
        let err = Error::decode(Category::Projects, "expected object");
        assert_eq!(err.to_string(), "Decode error in projects: expected object");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_decode_error_keeps_category() {
        let err = Error::decode(Category::Projects, "bad options");
        assert!(matches!(
            err,
            Error::Decode { category: Category::Projects, ref message } if message == "bad options"
        ));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(err.to_string().starts_with("Database error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
