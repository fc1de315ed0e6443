//! Android debug signing.
//!
//! Keeps a local debug keystore, compares its certificate with the one on
//! the connected device, and removes the installed app when they disagree so
//! the next install succeeds.

mod config;
mod error;
mod manager;

pub use config::SigningConfig;
pub use error::SigningError;
pub use manager::{
    ConflictResolution, InstallOutcome, SignatureManager, is_signature_mismatch,
    parse_sha1_fingerprint,
};
