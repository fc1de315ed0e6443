//! Build failure classification and remediation.
//!
//! [`ErrorResolver`] matches raw build output against an ordered table of
//! [`ErrorPattern`]s. Automated remedies edit `gradle.properties` and run
//! their steps best-effort, recording one
//! [`ResolutionRecord`](buildmedic_types::resolution::ResolutionRecord) per
//! attempt. Manual remedies and unmatched errors only return advice.

mod pattern;
mod resolver;
mod suggest;

pub use pattern::{
    Action, ErrorPattern, PACKAGE, PatternInfo, Remedy, Severity, Step, builtin_patterns,
};
pub use resolver::{ErrorResolver, PatternStats, Resolution};
pub use suggest::suggestions_for;
