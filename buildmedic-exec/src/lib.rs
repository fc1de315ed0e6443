//! Subprocess plumbing for buildmedic.
//!
//! Every external tool (gradle, adb, keytool, npm, ...) is reached through the
//! [`CommandRunner`] port. Production code uses [`SystemRunner`]; tests use
//! [`ScriptedRunner`], which replays canned output and records invocations.
//!
//! Best-effort sequences report each step explicitly through [`StepReport`]
//! instead of swallowing failures.

mod runner;
mod scripted;
mod steps;

pub use runner::{CommandOutput, CommandRunner, CommandSpec, ExecError, SystemRunner};
pub use scripted::ScriptedRunner;
pub use steps::{
    StepOutcome, StepReport, StepResult, command_step, remove_glob_step, remove_path_step,
};
