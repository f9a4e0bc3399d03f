//! Port interfaces for the external auth endpoints

use async_trait::async_trait;
use feedwire_domain::{ApiError, TokenPair};

/// Login and refresh endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}
