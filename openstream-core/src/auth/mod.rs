//! Bearer-token authentication and role-based capability checks

mod config;
mod error;
mod principal;
mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use principal::{Operation, Principal, Role};
pub use token::{TokenClaims, TokenService};
