//! Development environment validation.
//!
//! [`EnvironmentValidator`] runs a fixed, ordered set of independent checks
//! (toolchain versions, Android SDK, device bridge, variables, installed
//! dependencies) and aggregates them into a
//! [`ValidationSummary`](buildmedic_types::env::ValidationSummary).

mod host;
mod requirements;
mod validator;
mod version;

pub use host::{HostEnv, MapEnv, ProcessEnv};
pub use requirements::EnvRequirements;
pub use validator::{EnvironmentValidator, connected_devices};
pub use version::{compare_versions, parse_java_version, strip_range};
