//! Error types for the provider client.

use thiserror::Error;

use crate::provider::diagnostics::Diagnostic;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors raised by schema translation, value encoding, and the provider façade.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The wire schema is malformed or missing required metadata.
    #[error("Schema read error: {0}")]
    SchemaRead(String),

    /// A wire type descriptor this client cannot represent.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// The caller named a resource or data source type the provider does not declare.
    #[error("Invalid type: {kind} '{type_name}' is not declared by the provider")]
    InvalidType {
        kind: &'static str,
        type_name: String,
    },

    /// A host value does not match its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider reported diagnostics for an operation.
    #[error(transparent)]
    Diagnostics(#[from] DiagnosticError),

    /// A response that must carry a value carried none.
    #[error("Decode failure: {0}")]
    Decode(String),

    #[error("Failed to encode value as msgpack: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Failed to decode msgpack value: {0}")]
    Msgpack(#[from] rmpv::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The RPC itself failed (provider crashed, connection dropped, ...).
    #[error("Provider RPC failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Provider handshake failed: {0}")]
    Handshake(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural mismatch between a host value and a schema type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation error at '{path}': {message}")]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `ingress[0].port`.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One or more diagnostics returned by the provider for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} returned diagnostics:\n{}", render(.diagnostics))]
pub struct DiagnosticError {
    pub operation: &'static str,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticError {
    /// Summaries of every diagnostic, in the order the provider sent them.
    pub fn summaries(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.summary.as_str()).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ProviderError {
    pub(crate) fn schema_read(msg: impl Into<String>) -> Self {
        Self::SchemaRead(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
