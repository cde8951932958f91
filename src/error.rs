//! Error taxonomy for sales generation
//!
//! - `Configuration` - malformed or missing settings, raised before any generation
//! - `GenerationTask` - a register or store task failed; aborts the whole chain-day
//! - `Persistence` - the sales writer could not store a finished day

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SalesError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("generation task failed in {scope}: {reason}")]
    GenerationTask { scope: String, reason: String },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl SalesError {
    pub fn config(msg: impl Into<String>) -> Self {
        SalesError::Configuration(msg.into())
    }

    pub fn task(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        SalesError::GenerationTask { scope: scope.into(), reason: reason.into() }
    }

    /// Attribute the error to `scope`; a task error keeps its reason, other kinds become it
    pub fn in_scope(self, scope: &str) -> Self {
        match self {
            SalesError::GenerationTask { reason, .. } => SalesError::task(scope, reason),
            other => SalesError::task(scope, other.to_string()),
        }
    }
}

impl From<std::io::Error> for SalesError {
    fn from(e: std::io::Error) -> Self {
        SalesError::Persistence(e.to_string())
    }
}

impl From<csv::Error> for SalesError {
    fn from(e: csv::Error) -> Self {
        SalesError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for SalesError {
    fn from(e: serde_json::Error) -> Self {
        SalesError::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_message() {
        let err = SalesError::task("register Ab", "quantity pool is empty");
        assert_eq!(
            err.to_string(),
            "generation task failed in register Ab: quantity pool is empty"
        );
    }

    #[test]
    fn test_in_scope_replaces_task_scope() {
        let err = SalesError::task("catalog", "quantity pool is empty").in_scope("register Aa");
        assert_eq!(
            err.to_string(),
            "generation task failed in register Aa: quantity pool is empty"
        );
    }

    #[test]
    fn test_in_scope_wraps_other_kinds() {
        let err = SalesError::config("bad").in_scope("store B");
        match err {
            SalesError::GenerationTask { scope, reason } => {
                assert_eq!(scope, "store B");
                assert_eq!(reason, "configuration error: bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(SalesError::from(io), SalesError::Persistence(_)));
    }
}
