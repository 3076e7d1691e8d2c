use thiserror::Error;

use crate::actions::ActionKind;

/// Failures while loading or validating viewer configuration.
///
/// Reconciliation itself never fails; only configuration can.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("address schema has no levels")]
    EmptySchema,
    #[error("level `{0}` is declared more than once")]
    DuplicateLevel(String),
    #[error("key order does not match schema levels: {0}")]
    KeyOrder(String),
    #[error("level `{0}` enumerates no values")]
    EmptyEnumeration(String),
    #[error("query binding depends on {0:?}, which has no binding")]
    MissingDependency(ActionKind),
    #[error("query bindings form a dependency cycle at {0:?}")]
    BindingCycle(ActionKind),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
