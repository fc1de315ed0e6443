//! Embeddable core library for buildmedic.
//!
//! Provides a clap-free entry point that wires the services together:
//! environment validation, signing, error resolution, build workflows and
//! health monitoring. All I/O goes through the traits re-exported in [`ports`].
//!
//! # Entry point
//!
//! - [`BuildManager::build_and_deploy`]: validate, reconcile signing, build,
//!   remediate and retry once, record the outcome.

mod error;
mod manager;
pub mod ports;
pub mod settings;

pub use error::ManagerError;
pub use manager::{BuildManager, Diagnosis, SignatureFix};
pub use ports::Ports;
pub use settings::ManagerSettings;
