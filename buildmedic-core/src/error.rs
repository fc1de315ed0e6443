use buildmedic_signing::SigningError;
use buildmedic_types::build::{Environment, Platform};

/// Errors surfaced by [`BuildManager`](crate::BuildManager).
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("environment is not ready: {}", .errors.join("; "))]
    EnvironmentInvalid { errors: Vec<String> },

    #[error("{platform} {environment} build failed: {message}")]
    BuildFailed {
        platform: Platform,
        environment: Environment,
        message: String,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}
