use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    #[error("Decomposition engine is not initialized")]
    NotInitialized,

    #[error("Invalid decomposition config: {0}")]
    InvalidConfig(String),

    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("Decomposition timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposition_error_display() {
        let error = DecompositionError::NotInitialized;
        assert_eq!(format!("{}", error), "Decomposition engine is not initialized");

        let error = DecompositionError::DependencyCycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(format!("{}", error), "Circular dependency detected: a -> b -> a");
    }
}
