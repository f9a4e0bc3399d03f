//! Bearer-token helpers.

pub mod jwt;
