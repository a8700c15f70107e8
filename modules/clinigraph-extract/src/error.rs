//! Error taxonomy for the extraction pipeline.

use std::path::PathBuf;

use ai_client::AiError;
use thiserror::Error;

/// Model output that could not be coerced into JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not decode {context} response: {reason} (text starts: {excerpt:?})")]
pub struct DecodeError {
    pub context: String,
    pub reason: String,
    /// Bounded prefix of the offending text.
    pub excerpt: String,
}

/// Decoded JSON that violates the node/edge contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{path}: {message}")]
    Structure { path: String, message: String },

    #[error("{path}: unknown node type `{value}`")]
    UnknownNodeType { path: String, value: String },

    #[error("{path}: unknown edge type `{value}`")]
    UnknownEdgeType { path: String, value: String },

    #[error("{path}: duplicate node id `{id}`")]
    DuplicateNodeId { path: String, id: String },

    #[error("{path}: edge {endpoint} `{id}` is not a declared node id")]
    DanglingEndpoint {
        path: String,
        endpoint: &'static str,
        id: String,
    },
}

impl SchemaError {
    /// JSON path of the offending element.
    pub fn path(&self) -> &str {
        match self {
            SchemaError::Structure { path, .. }
            | SchemaError::UnknownNodeType { path, .. }
            | SchemaError::UnknownEdgeType { path, .. }
            | SchemaError::DuplicateNodeId { path, .. }
            | SchemaError::DanglingEndpoint { path, .. } => path,
        }
    }

    pub(crate) fn structure(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Structure {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure inside the risk-coverage pass. Never fatal to an extraction.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("risk projection call failed: {0}")]
    Gateway(#[from] AiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("risk projection response has unexpected shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("refusing to persist invalid document: {0}")]
    Invalid(#[from] SchemaError),
}

/// Fatal extraction failure. No partial graph accompanies it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model gateway failed: {0}")]
    Gateway(#[from] AiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_exposes_path() {
        let err = SchemaError::DuplicateNodeId {
            path: "$.nodes[3].id".into(),
            id: "n1".into(),
        };
        assert_eq!(err.path(), "$.nodes[3].id");
        assert_eq!(err.to_string(), "$.nodes[3].id: duplicate node id `n1`");
    }

    #[test]
    fn decode_error_message_names_context() {
        let err = DecodeError {
            context: "graph extraction".into(),
            reason: "expected value at line 1 column 1".into(),
            excerpt: "Sorry, I".into(),
        };
        let message = err.to_string();
        assert!(message.contains("graph extraction"));
        assert!(message.contains("Sorry, I"));
    }
}
