use thiserror::Error;

/// Errors raised while interpreting IAM documents.
#[derive(Debug, Error)]
pub enum IamError {
    /// A capability entry did not have the `{acl: {actions, scope}}` shape.
    #[error("malformed capability: {0}")]
    MalformedCapability(String),

    /// The desired-groups source document could not be interpreted.
    #[error("malformed source document: {0}")]
    MalformedSource(String),

    /// A scope identifier was neither an integer nor a numeric string.
    #[error("invalid identifier {value} in {kind}")]
    InvalidScopeId { kind: String, value: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
