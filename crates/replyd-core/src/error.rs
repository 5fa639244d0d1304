// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the replyd review pipeline.

use thiserror::Error;

/// The primary error type used across all replyd adapter traits and pipeline operations.
#[derive(Debug, Error)]
pub enum ReplydError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connector errors (network failure, rejected credential, malformed response).
    #[error("connector error ({platform}): {message}")]
    Connector {
        platform: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Credential vault errors (wrong passphrase, corrupted token).
    #[error("vault error: {0}")]
    Vault(String),

    /// The requested reply template does not exist.
    #[error("template not found: {0}")]
    TemplateNotFound(i64),

    /// The requested account does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(i64),

    /// No connector is registered for the account's platform.
    #[error("no connector registered for platform `{platform}`")]
    ConnectorNotFound { platform: String },

    /// A review returned by a connector could not be accepted.
    #[error("malformed review `{external_review_id}`: {reason}")]
    MalformedReview {
        external_review_id: String,
        reason: String,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReplydError {
    /// Shorthand for a connector error without an underlying source.
    pub fn connector(platform: impl Into<String>, message: impl Into<String>) -> Self {
        ReplydError::Connector {
            platform: platform.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any storage-side error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ReplydError::Storage {
            source: Box::new(err),
        }
    }
}
