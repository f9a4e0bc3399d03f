//! Bearer-token state: persistence, expiry checks and refresh.

pub mod ports;
pub mod refresh;
pub mod token_store;

pub use ports::AuthGateway;
pub use refresh::RefreshCoordinator;
pub use token_store::TokenStore;
