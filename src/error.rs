//! Error types for the Zentral provider.
//!
//! Two layers: [`ClientError`] covers everything the backend HTTP client can
//! fail with (carrying the status code and raw body text so adapters can
//! propagate it verbatim), and [`ProviderError`] covers the adapter-level
//! taxonomy: configuration, validation, translation, backend and
//! serialization failures. Errors are never swallowed; every failing path
//! returns before mutating state.

use thiserror::Error;

/// Errors raised by the backend HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.
    #[error("API error (status {status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// The request could not be performed (connection, TLS, cancellation).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),

    /// The client could not be constructed from its configuration.
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// The HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors that can occur inside resource adapters and the provider registry.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred (missing credentials, configure-time
    /// type mismatch). All subsequent calls short-circuit with the same
    /// error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown to the registry.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The model could not be translated into a backend request.
    #[error("Unable to prepare {kind} {operation} request: {detail}")]
    Translation {
        /// The resource kind being translated.
        kind: String,
        /// The lifecycle operation (create, update, ...).
        operation: String,
        /// What went wrong.
        detail: String,
    },

    /// A backend call failed during a lifecycle operation.
    #[error("Unable to {operation} {kind}{}: {source}", id_suffix(.id))]
    Backend {
        /// The resource kind being operated on.
        kind: String,
        /// The lifecycle operation (create, read, update, delete).
        operation: String,
        /// The object id, when the operation targets one.
        id: Option<String>,
        /// The underlying client failure, raw body text intact.
        #[source]
        source: ClientError,
    },

    /// A backend call failed outside any lifecycle operation.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// A state value did not match the model shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_ref().map_or_else(String::new, |id| format!(" {}", id))
}

impl ProviderError {
    /// Backend-failure constructor tagging the operation and its target.
    pub fn backend(kind: &str, operation: &str, id: Option<String>, source: ClientError) -> Self {
        Self::Backend {
            kind: kind.to_string(),
            operation: operation.to_string(),
            id,
            source,
        }
    }

    /// Translation-failure constructor matching the adapter template.
    pub fn translation(kind: &str, operation: &str, detail: impl Into<String>) -> Self {
        Self::Translation {
            kind: kind.to_string(),
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }

    /// Re-tag a translation error with the lifecycle operation in progress.
    /// Model codecs do not know which operation called them; the adapter
    /// does.
    pub fn for_operation(self, operation: &str) -> Self {
        match self {
            Self::Translation { kind, detail, .. } => Self::Translation {
                kind,
                operation: operation.to_string(),
                detail,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("tag 123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: tag 123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("zentral_widget".to_string());
        assert_eq!(
            format!("{}", err),
            "Unknown resource type: zentral_widget"
        );
    }

    #[test]
    fn test_translation_error_display() {
        let err = ProviderError::translation("tag", "create", "invalid color");
        assert_eq!(
            format!("{}", err),
            "Unable to prepare tag create request: invalid color"
        );
    }

    #[test]
    fn test_for_operation_retags_translation_errors() {
        let err = ProviderError::translation("tag", "serialize", "invalid color")
            .for_operation("update");
        assert_eq!(
            format!("{}", err),
            "Unable to prepare tag update request: invalid color"
        );

        let err = ProviderError::NotFound("tag 1".to_string()).for_operation("update");
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[test]
    fn test_backend_error_display() {
        let err = ProviderError::backend(
            "tag",
            "read",
            Some("999".to_string()),
            ClientError::Status {
                status: 404,
                body: "{\"detail\": \"Not found.\"}".to_string(),
            },
        );
        assert_eq!(
            format!("{}", err),
            "Unable to read tag 999: API error (status 404): {\"detail\": \"Not found.\"}"
        );

        // No id for create failures.
        let err = ProviderError::backend(
            "tag",
            "create",
            None,
            ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(
            format!("{}", err),
            "Unable to create tag: API error (status 500): boom"
        );
    }

    #[test]
    fn test_client_error_status() {
        let err = ClientError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            format!("{}", err),
            "API error (status 404): not found"
        );

        let err = ClientError::Configuration("bad ca certificate".to_string());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_client_error_converts_to_provider_error() {
        let err: ProviderError = ClientError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ProviderError::Client(_)));
        assert!(format!("{}", err).contains("status 500"));
    }
}
