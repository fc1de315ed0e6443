//! The I/O ports every service is built from.
//!
//! - [`CommandRunner`]: subprocesses (gradle, adb, keytool, npm, ...)
//! - [`HostEnv`]: environment variables
//! - [`StateStore`]: the state directory
//! - [`Clock`]: timestamps for build records and alerts

pub use buildmedic_env::HostEnv;
pub use buildmedic_exec::CommandRunner;
pub use buildmedic_monitor::Clock;
pub use buildmedic_store::StateStore;

use buildmedic_env::ProcessEnv;
use buildmedic_exec::SystemRunner;
use buildmedic_monitor::SystemClock;
use buildmedic_store::FsStateStore;
use camino::Utf8PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct Ports {
    pub runner: Arc<dyn CommandRunner>,
    pub host: Arc<dyn HostEnv>,
    pub store: Arc<dyn StateStore>,
    pub clock: Arc<dyn Clock>,
}

impl Ports {
    /// Real processes, process environment, filesystem state and wall clock.
    pub fn system(state_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            runner: Arc::new(SystemRunner),
            host: Arc::new(ProcessEnv),
            store: Arc::new(FsStateStore::new(state_dir)),
            clock: Arc::new(SystemClock),
        }
    }
}
