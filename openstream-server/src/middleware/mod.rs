//! Middleware for the OpenStream server

mod auth;
mod timing;

pub use auth::{auth_middleware, extract_bearer};
pub use timing::track_duration;
