//! Shape validation port for list responses.

use serde_json::Value;

/// Checks that a raw list response has the shape `endpoint_name` promises
/// (pagination envelope, item fields). Owned by the UI layer.
pub trait ListResponseValidator: Send + Sync {
    fn validate(&self, raw: &Value, endpoint_name: &str) -> bool;
}

/// Validator that accepts every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl ListResponseValidator for AcceptAllValidator {
    fn validate(&self, _raw: &Value, _endpoint_name: &str) -> bool {
        true
    }
}
