// storegate-api: Async Rust client for the storefront backend's identity endpoints

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::StorefrontClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{AuthCheckResponse, LoginResponse, RegisterResponse, UserPayload};
