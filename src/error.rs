use crate::lifecycle::Phase;
use std::time::Duration;
use thiserror::Error;

/// Type-erased error returned by component hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Component name is empty")]
    EmptyName,

    #[error("Component {name:?} is already registered")]
    DuplicateName { name: String },

    #[error("Component {name:?} is not registered")]
    UnknownComponent { name: String },

    #[error("Circular dependency detected for component {name:?}")]
    CircularDependency { name: String },

    #[error("Required component {name:?} is not registered")]
    UnregisteredDependency { name: String },

    #[error("Initialization failed for {component}: {source}")]
    Initialization {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("Validation failed for {component}: {source}")]
    Validation {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("Cleanup failed for {component}: {source}")]
    Cleanup {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("Start hook failed for {component}: {source}")]
    Start {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("Stop hook failed for {component}: {source}")]
    Stop {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("Timeout during {phase} after {timeout:?}")]
    DeadlineExceeded { phase: Phase, timeout: Duration },

    #[error("{phase} was cancelled by the caller")]
    Cancelled { phase: Phase },

    #[error("{phase} task panicked")]
    Panicked { phase: Phase },

    #[error("Invalid config for {component}: {source}")]
    Config {
        component: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),

    #[error("Install failed for component {component:?}: {source}")]
    InstallFailed {
        component: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Unwraps any install wrapper and returns the error that actually occurred
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::InstallFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_circular_dependency(&self) -> bool {
        matches!(self.root_cause(), AppError::CircularDependency { .. })
    }

    pub fn is_unregistered_dependency(&self) -> bool {
        matches!(self.root_cause(), AppError::UnregisteredDependency { .. })
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self.root_cause(), AppError::DeadlineExceeded { .. })
    }

    /// Name of the component the error is attributed to, if any
    pub fn component(&self) -> Option<&str> {
        match self {
            AppError::DuplicateName { name }
            | AppError::UnknownComponent { name }
            | AppError::CircularDependency { name } => Some(name),
            AppError::Initialization { component, .. }
            | AppError::Validation { component, .. }
            | AppError::Cleanup { component, .. }
            | AppError::Start { component, .. }
            | AppError::Stop { component, .. }
            | AppError::Config { component, .. }
            | AppError::InstallFailed { component, .. } => Some(component),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_through_install_wrapper() {
        let err = AppError::InstallFailed {
            component: "api".to_string(),
            source: Box::new(AppError::CircularDependency {
                name: "db".to_string(),
            }),
        };

        assert!(err.is_circular_dependency());
        assert!(!err.is_deadline_exceeded());
        assert_eq!(err.component(), Some("api"));
        assert_eq!(err.root_cause().component(), Some("db"));
        assert_eq!(
            err.to_string(),
            "Install failed for component \"api\": Circular dependency detected for component \"db\""
        );
    }

    #[test]
    fn test_hook_error_keeps_source() {
        let err = AppError::Start {
            component: "http".to_string(),
            source: "address in use".into(),
        };

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "address in use");
        assert_eq!(err.to_string(), "Start hook failed for http: address in use");
    }
}
