//! Client side of the CSRF double-submit protocol.

pub mod recovery;
pub mod token_store;

pub use recovery::{is_csrf_failure, matches_csrf_signature, CsrfRecovery, RecoveryOutcome};
pub use token_store::CsrfTokenStore;
