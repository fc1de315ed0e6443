use buildmedic_exec::ExecError;
use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("failed to generate debug keystore at {path}: {message}")]
    KeystoreGeneration { path: Utf8PathBuf, message: String },

    #[error("install failed: {message}")]
    InstallFailed { message: String },

    /// The install failed again after uninstalling the conflicting app.
    #[error("install failed after uninstalling {package}: {message}")]
    RetryFailed { package: String, message: String },

    #[error("failed to uninstall {package}: {message}")]
    Uninstall { package: String, message: String },

    #[error(transparent)]
    Tool(#[from] ExecError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
