//! Build workflows for the mobile project.
//!
//! - [`WorkflowAutomation::build`]: profile upsert, platform build, artifact lookup,
//!   and install of development Android builds.
//! - [`WorkflowAutomation::clean_build`]: best-effort reset of outputs and caches.
//! - [`WorkflowAutomation::switch_environment`]: manifest and `.env` rewrite.

pub mod profile;
mod settings;
mod workflow;

pub use profile::{AndroidProfile, IosProfile};
pub use settings::WorkflowSettings;
pub use workflow::{BuildOutcome, DEVELOPMENT_FLAG_POINTER, WorkflowAutomation};
