// Application state module
// Immutable per-process state shared by every request handler

use super::types::Config;
use crate::signature::SignatureVerifier;

/// Application state
///
/// Built once at startup and shared through `Arc` without locking.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// `None` when signing is disabled
    pub verifier: Option<SignatureVerifier>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            verifier: SignatureVerifier::new(&config.secret),
        }
    }

    /// Root directory request paths are appended to
    pub fn root(&self) -> &str {
        &self.config.root
    }
}
