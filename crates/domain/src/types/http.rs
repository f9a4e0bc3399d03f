//! HTTP vocabulary

use serde::{Deserialize, Serialize};

use crate::impl_wire_enum_conversions;

/// Methods the client issues. Anything else is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl_wire_enum_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

impl HttpMethod {
    /// State-changing methods carry the CSRF header; `GET` never does.
    #[must_use]
    pub const fn is_state_changing(self) -> bool {
        !matches!(self, Self::Get)
    }
}
