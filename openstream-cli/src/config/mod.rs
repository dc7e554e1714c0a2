mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_OVERRIDES};
pub use types::{LogFormat, OpenStreamConfig};
